pub mod health;
pub mod tasks;
pub mod users;

use actix_web::web;

use crate::auth::RequireRole;
use crate::error::ApiError;

/// Registers the full route table under the caller's scope (`/api/v1` in
/// production). Authentication is applied by the caller via `AuthMiddleware`;
/// role allow-lists are configured statically per resource here.
pub fn config(cfg: &mut web::ServiceConfig) {
    // Deserialization and path errors also answer with the envelope.
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _| ApiError::BadRequest(err.to_string()).into()),
    );
    cfg.app_data(
        web::PathConfig::default()
            .error_handler(|err, _| ApiError::BadRequest(err.to_string()).into()),
    );

    cfg.service(
        web::scope("/user")
            .route("/register", web::post().to(users::register))
            .route("/login", web::post().to(users::login))
            .route("/refresh-token", web::post().to(users::refresh_token))
            .service(
                web::resource("/logout")
                    .wrap(RequireRole::any_role())
                    .route(web::post().to(users::logout)),
            )
            .service(
                web::resource("/update-user")
                    .wrap(RequireRole::any_role())
                    .route(web::put().to(users::update_user)),
            )
            .service(
                web::resource("/delete-user/{id}")
                    .wrap(RequireRole::admin_only())
                    .route(web::delete().to(users::delete_user)),
            )
            .service(
                web::resource("/fetch-all-users")
                    .wrap(RequireRole::admin_only())
                    .route(web::get().to(users::fetch_all_users)),
            )
            .service(
                web::resource("/fetch-user/{id}")
                    .wrap(RequireRole::admin_only())
                    .route(web::get().to(users::fetch_user)),
            ),
    )
    .service(
        web::scope("/task")
            .service(
                web::resource("/add-task")
                    .wrap(RequireRole::any_role())
                    .route(web::post().to(tasks::add_task)),
            )
            .service(
                web::resource("/fetch-tasks")
                    .wrap(RequireRole::any_role())
                    .route(web::get().to(tasks::fetch_tasks)),
            )
            .service(
                web::resource("/fetch-all-tasks")
                    .wrap(RequireRole::admin_only())
                    .route(web::get().to(tasks::fetch_all_tasks)),
            )
            .service(
                web::resource("/update-task/{id}")
                    .wrap(RequireRole::any_role())
                    .route(web::put().to(tasks::update_task)),
            )
            .service(
                web::resource("/delete-task/{id}")
                    .wrap(RequireRole::any_role())
                    .route(web::delete().to(tasks::delete_task)),
            ),
    );
}
