pub mod models;
pub mod routes;
pub mod services;

use poem::{
    Endpoint, EndpointExt, Route,
    middleware::{Cors, Tracing as PoemTracing},
};
use poem_openapi::OpenApiService;

pub use routes::ProgressApi;

/// The HTTP application: OpenAPI routes at `/`, RapiDoc at `/ui`, the document at `/spec`.
pub fn app(api: ProgressApi, server_url: &str) -> impl Endpoint + use<> {
    let version = env!("CARGO_PKG_VERSION");
    let api_service =
        OpenApiService::new(api, "Comic Progress API", version).server(server_url);
    let ui = api_service.rapidoc();
    let spec = api_service.spec();
    Route::new()
        .nest("/", api_service)
        .nest("/ui", ui)
        .nest("/spec", poem::endpoint::make_sync(move |_| spec.clone()))
        .with(Cors::new())
        .with(PoemTracing)
}
