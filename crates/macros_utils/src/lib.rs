//! Small declarative helpers shared by the HTTP apps.

#[cfg(feature = "actix")]
#[doc(hidden)]
pub use actix_web;

/// Declares a `routes(&mut ServiceConfig)` function for the current module.
///
/// `route name` registers an actix handler generated by `#[get]`/`#[post]`/...,
/// `scope name` delegates to `name::routes`.
///
/// ```ignore
/// macros_utils::routes! {
///     route health_route,
///     scope feed,
/// }
/// ```
#[cfg(feature = "actix")]
#[macro_export]
macro_rules! routes {
    ($($kind:ident $name:ident),* $(,)?) => {
        pub fn routes(cfg: &mut $crate::actix_web::web::ServiceConfig) {
            $( $crate::__route_entry!(cfg, $kind $name); )*
        }
    };
}

#[cfg(feature = "actix")]
#[doc(hidden)]
#[macro_export]
macro_rules! __route_entry {
    ($cfg:ident, route $name:ident) => {
        $cfg.service($name);
    };
    ($cfg:ident, scope $name:ident) => {
        $name::routes($cfg);
    };
}
