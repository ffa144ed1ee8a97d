pub mod auth;
pub mod health;
pub mod tasks;

use actix_web::web;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(auth::register)
            .service(auth::login)
            .service(auth::verify_email)
            .service(auth::resend_verification)
            .service(auth::forgot_password)
            .service(auth::verify_otp)
            .service(auth::reset_password)
            .service(auth::google)
            .service(auth::google_callback)
            .service(auth::google_mobile)
            .service(auth::profile),
    )
    .service(
        web::scope("/tasks")
            .service(tasks::get_tasks)
            .service(tasks::create_task)
            .service(tasks::get_task)
            .service(tasks::update_task)
            .service(tasks::toggle_task_status)
            .service(tasks::delete_task),
    );
}
