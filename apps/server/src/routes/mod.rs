use actix_web::web;

mod feed;
mod health;

pub fn routes(cfg: &mut web::ServiceConfig) {
    health::routes(cfg);
    cfg.service(web::scope("/feed").configure(feed::routes));
}
