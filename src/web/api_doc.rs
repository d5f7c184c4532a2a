use utoipa::OpenApi;

use crate::telemetry::TelemetrySnapshot;

#[derive(OpenApi)]
#[openapi(
    paths(super::api::simconnect::simconnect),
    components(schemas(TelemetrySnapshot)),
    info(
        title = "SimConnect Proxy API",
        description = "Live aircraft telemetry for moving-map clients",
        version = "0.1.0"
    ),
    tags(
        (name = "simconnect", description = "Aircraft position, altitude and heading")
    )
)]
pub struct ApiDoc;
