mod auth;
mod config;
mod database;
mod db;
mod error;
mod middleware;
mod models;
mod routes;
mod service;

#[cfg(test)]
pub mod test_utils;

pub use config::Config;
pub use error::app_error::AppError;

use crate::db::stage_db;
use crate::middleware::RequestLogger;
use crate::routes as app_routes;
use crate::service::media::MediaStore;
use crate::service::session::SessionManager;
use rocket::data::{Limits, ToByteUnit};
use rocket::fairing::AdHoc;
use rocket::fs::{FileServer, Options};
use rocket::{Build, Rocket, catchers, http::Method};
use rocket_cors::{AllowedOrigins, CorsOptions};
use rocket_okapi::swagger_ui::{SwaggerUIConfig, make_swagger_ui};
use rocket_okapi::{get_openapi_route, okapi::merge::marge_spec_list};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn init_tracing(log_level: &str, json_format: bool) {
    // RUST_LOG takes precedence over the configured level, e.g.
    //   RUST_LOG=cartrack::service=debug,info
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).with_target(true).with_line_number(true);

    // Route tests build several rockets in one process; only the first subscriber sticks.
    if json_format {
        let _ = subscriber.json().try_init();
    } else {
        let _ = subscriber.try_init();
    }
}

fn build_cors(cors_config: &config::CorsConfig) -> CorsOptions {
    let is_wildcard = cors_config.allowed_origins.len() == 1 && cors_config.allowed_origins[0] == "*";

    // Validate that wildcard origins are not combined with credentials
    if is_wildcard && cors_config.allow_credentials {
        panic!(
            "Invalid CORS configuration: Cannot use wildcard origins (*) with credentials enabled. \
            Either set specific origins or disable credentials."
        );
    }

    let allowed_origins = if cors_config.allowed_origins.is_empty() {
        AllowedOrigins::some_exact::<&str>(&[])
    } else if is_wildcard {
        AllowedOrigins::all()
    } else {
        AllowedOrigins::some_exact(&cors_config.allowed_origins.iter().map(String::as_str).collect::<Vec<_>>())
    };

    CorsOptions {
        allowed_origins,
        allowed_methods: vec![Method::Get, Method::Post, Method::Put, Method::Delete, Method::Options, Method::Head]
            .into_iter()
            .map(From::from)
            .collect(),
        allowed_headers: rocket_cors::AllowedHeaders::some(&["Content-Type", "Accept", auth::SESSION_HEADER]),
        expose_headers: ["X-Request-Id".to_string()].into_iter().collect(),
        allow_credentials: cors_config.allow_credentials,
        ..Default::default()
    }
}

fn get_swagger_config(openapi_url: &str) -> SwaggerUIConfig {
    SwaggerUIConfig {
        url: openapi_url.to_string(),
        ..Default::default()
    }
}

fn normalize_base_path(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return config::DEFAULT_API_BASE_PATH.to_string();
    }

    let mut normalized = if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    };

    while normalized.ends_with('/') && normalized.len() > 1 {
        normalized.pop();
    }

    normalized
}

fn join_base_path(base_path: &str, path: &str) -> String {
    let base = base_path.trim_end_matches('/');
    let suffix = path.trim_start_matches('/');

    if base.is_empty() {
        format!("/{}", suffix)
    } else {
        format!("{}/{}", base, suffix)
    }
}

fn collect_base_paths(api_config: &config::ApiConfig) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::new();
    let mut push_unique = |path: String| {
        if !normalized.contains(&path) {
            normalized.push(path);
        }
    };

    push_unique(normalize_base_path(&api_config.base_path));

    for extra in &api_config.additional_base_paths {
        push_unique(normalize_base_path(extra));
    }

    normalized
}

struct RouteSpec {
    path: &'static str,
    routes: Vec<rocket::Route>,
    openapi: rocket_okapi::okapi::openapi3::OpenApi,
}

fn collect_route_specs() -> Vec<RouteSpec> {
    let (auth_routes, auth_openapi) = app_routes::auth::routes();
    let (car_routes, car_openapi) = app_routes::car::routes();
    let (car_fuel_routes, car_fuel_openapi) = app_routes::fuel::car_routes();
    let (car_part_routes, car_part_openapi) = app_routes::part::car_routes();
    let (fuel_routes, fuel_openapi) = app_routes::fuel::routes();
    let (part_routes, part_openapi) = app_routes::part::routes();
    let (health_routes, health_openapi) = app_routes::health::routes();

    vec![
        RouteSpec {
            path: "/auth",
            routes: auth_routes,
            openapi: auth_openapi,
        },
        RouteSpec {
            path: "/cars",
            routes: car_routes,
            openapi: car_openapi,
        },
        RouteSpec {
            path: "/cars",
            routes: car_fuel_routes,
            openapi: car_fuel_openapi,
        },
        RouteSpec {
            path: "/cars",
            routes: car_part_routes,
            openapi: car_part_openapi,
        },
        RouteSpec {
            path: "/fuel",
            routes: fuel_routes,
            openapi: fuel_openapi,
        },
        RouteSpec {
            path: "/parts",
            routes: part_routes,
            openapi: part_openapi,
        },
        RouteSpec {
            path: "/health",
            routes: health_routes,
            openapi: health_openapi,
        },
    ]
}

fn mount_api_routes(mut rocket: Rocket<Build>, base_path: &str, enable_swagger: bool) -> Rocket<Build> {
    let route_specs = collect_route_specs();

    if enable_swagger {
        let mut openapi_list = Vec::new();
        for spec in route_specs {
            rocket = rocket.mount(format!("{}{}", base_path, spec.path), spec.routes);
            openapi_list.push((spec.path, spec.openapi));
        }

        let openapi_docs = match marge_spec_list(&openapi_list) {
            Ok(docs) => docs,
            Err(err) => panic!("Could not merge OpenAPI spec: {}", err),
        };

        let settings = rocket_okapi::settings::OpenApiSettings::default();
        rocket = rocket.mount(base_path, vec![get_openapi_route(openapi_docs, &settings)]);

        let docs_path = join_base_path(base_path, "docs");
        let openapi_url = join_base_path(base_path, "openapi.json");
        rocket = rocket.mount(docs_path, make_swagger_ui(&get_swagger_config(&openapi_url)));
    } else {
        for spec in route_specs {
            rocket = rocket.mount(format!("{}{}", base_path, spec.path), spec.routes);
        }
    }

    rocket
}

fn stage_sessions(session_config: config::SessionConfig) -> AdHoc {
    AdHoc::on_ignite("Session Registry", move |rocket| {
        let sessions = Arc::new(SessionManager::in_memory(&session_config));
        sessions.clone().spawn_sweeper();

        Box::pin(async move { rocket.manage(sessions) })
    })
}

fn stage_media(media_config: config::MediaConfig) -> AdHoc {
    AdHoc::try_on_ignite("Media Store", |rocket| async move {
        match MediaStore::open(&media_config).await {
            Ok(store) => Ok(rocket.manage(store)),
            Err(e) => {
                tracing::error!(error = ?e, "Media directory is not usable");
                Err(rocket)
            }
        }
    })
}

fn rocket_figment(config: &Config) -> rocket::figment::Figment {
    let max_upload = config.media.max_upload_bytes;
    let limits = Limits::default()
        .limit("file", max_upload.bytes())
        .limit("data-form", max_upload.saturating_add(1024 * 1024).bytes());

    rocket::Config::figment()
        .merge(("address", config.server.address.clone()))
        .merge(("port", config.server.port))
        .merge(("limits", limits))
}

pub fn build_rocket(config: Config) -> Rocket<Build> {
    init_tracing(&config.logging.level, config.logging.json_format);

    let cors = build_cors(&config.cors).to_cors().expect("Failed to create CORS fairing");

    let base_paths = collect_base_paths(&config.api);
    let media_prefix = config.media.public_prefix();

    let mut rocket = rocket::custom(rocket_figment(&config))
        .attach(cors)
        .attach(RequestLogger {
            media_prefix: media_prefix.clone(),
        })
        .attach(stage_db(config.database))
        .attach(stage_sessions(config.session))
        .attach(stage_media(config.media.clone()));

    let enable_swagger = config.api.enable_swagger;
    for base_path in &base_paths {
        rocket = mount_api_routes(rocket, base_path, enable_swagger);
    }

    // The staging directory is a dot directory and stays hidden.
    rocket = rocket.mount(media_prefix, FileServer::new(&config.media.root, Options::Missing));

    rocket.register(
        "/",
        catchers![
            app_routes::error::bad_request,
            app_routes::error::unauthorized,
            app_routes::error::not_found,
            app_routes::error::payload_too_large,
            app_routes::error::unprocessable_entity,
            app_routes::error::internal_error
        ],
    )
}
