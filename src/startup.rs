use actix_files as fs;
use actix_web::dev::Server;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;

use crate::auth::SessionManager;
use crate::configuration::Settings;
use crate::logger::LoggerMiddleware;
use crate::routes::{
    create_chirp, delete_chirp, get_chirp, health_check, list_chirps, login, polka_webhook,
    refresh, register, reset, revoke, update_user,
};
use crate::store::{ChirpStore, RefreshTokenStore, UserStore};

/// Storage collaborators the application runs against
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub chirps: Arc<dyn ChirpStore>,
    pub refresh_tokens: Arc<dyn RefreshTokenStore>,
}

impl Stores {
    /// All three collaborators served by one backend
    pub fn from_backend<S>(backend: Arc<S>) -> Self
    where
        S: UserStore + ChirpStore + RefreshTokenStore + 'static,
    {
        Self {
            users: backend.clone(),
            chirps: backend.clone(),
            refresh_tokens: backend,
        }
    }
}

pub fn run(listener: TcpListener, stores: Stores, settings: Settings) -> Result<Server, std::io::Error> {
    let sessions = web::Data::new(SessionManager::new(
        stores.users.clone(),
        stores.refresh_tokens.clone(),
        settings.auth.clone(),
    ));
    let users: web::Data<dyn UserStore> = web::Data::from(stores.users);
    let chirps: web::Data<dyn ChirpStore> = web::Data::from(stores.chirps);
    let refresh_tokens: web::Data<dyn RefreshTokenStore> = web::Data::from(stores.refresh_tokens);
    let application = web::Data::new(settings.application.clone());
    let webhooks = web::Data::new(settings.webhooks.clone());

    let server = HttpServer::new(move || {
        App::new()
            // Global middleware
            .wrap(Logger::default())
            .wrap(LoggerMiddleware)

            // Shared state
            .app_data(sessions.clone())
            .app_data(users.clone())
            .app_data(chirps.clone())
            .app_data(refresh_tokens.clone())
            .app_data(application.clone())
            .app_data(webhooks.clone())

            .service(
                web::scope("/api")
                    .route("/healthz", web::get().to(health_check))
                    .route("/users", web::post().to(register))
                    .route("/users", web::put().to(update_user))
                    .route("/login", web::post().to(login))
                    .route("/refresh", web::post().to(refresh))
                    .route("/revoke", web::post().to(revoke))
                    .route("/chirps", web::post().to(create_chirp))
                    .route("/chirps", web::get().to(list_chirps))
                    .route("/chirps/{chirp_id}", web::get().to(get_chirp))
                    .route("/chirps/{chirp_id}", web::delete().to(delete_chirp))
                    .route("/polka/webhooks", web::post().to(polka_webhook)),
            )
            .route("/admin/reset", web::post().to(reset))

            // Static file serving
            .service(fs::Files::new("/app", "./public").index_file("index.html"))
    })
    .listen(listener)?
    .run();

    Ok(server)
}
