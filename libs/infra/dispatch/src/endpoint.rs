// [libs/infra/dispatch/src/endpoint.rs]
/*!
 * =================================================================
 * APARATO: ENDPOINT NORMALIZATION (V4.2 - GOLD MASTER)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: DERIVACIÓN DE URIS LÍDER Y TRABAJADOR
 *
 * # Reglas:
 * - Solo esquemas http/https.
 * - Si la ruta no termina en '/runReplicates', se anexa.
 * - La URI de trabajador reemplaza ese sufijo por '/runReplicate'.
 * =================================================================
 */

use crate::errors::DispatchFault;
use url::Url;

/// Segmento final del rol líder (coordina N réplicas).
pub const LEADER_PATH_SEGMENT: &str = "runReplicates";
/// Segmento final del rol trabajador (ejecuta una réplica).
pub const WORKER_PATH_SEGMENT: &str = "runReplicate";

/// Líder en la nube pública: exige clave de API antes de transmitir.
pub const PUBLIC_CLOUD_ENDPOINT: &str = "https://cloud.joshsim.org/runReplicates";

/// Par de URIs derivadas de la entrada del operador.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointPlan {
    pub leader_uri: Url,
    pub worker_uri: Url,
}

/// Normaliza la URI del operador al par líder/trabajador.
///
/// # Errors:
/// - `EndpointInvalid` ante sintaxis inválida o esquema no HTTP.
pub fn normalize_endpoint(raw_endpoint: &str) -> Result<EndpointPlan, DispatchFault> {
    let parsed_endpoint = Url::parse(raw_endpoint).map_err(|parse_fault| {
        DispatchFault::EndpointInvalid {
            uri: raw_endpoint.to_string(),
            reason: parse_fault.to_string(),
        }
    })?;

    match parsed_endpoint.scheme() {
        "http" | "https" => {}
        rejected_scheme => {
            return Err(DispatchFault::EndpointInvalid {
                uri: raw_endpoint.to_string(),
                reason: format!("scheme '{}' is not http/https", rejected_scheme),
            });
        }
    }

    let mut path_segments: Vec<String> = parsed_endpoint
        .path_segments()
        .map(|segments| {
            segments
                .filter(|segment| !segment.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    if path_segments.last().map(String::as_str) != Some(LEADER_PATH_SEGMENT) {
        path_segments.push(LEADER_PATH_SEGMENT.to_string());
    }

    let leader_uri = with_path_segments(&parsed_endpoint, &path_segments);

    let last_position = path_segments.len() - 1;
    path_segments[last_position] = WORKER_PATH_SEGMENT.to_string();
    let worker_uri = with_path_segments(&parsed_endpoint, &path_segments);

    Ok(EndpointPlan { leader_uri, worker_uri })
}

/// Antesala de autenticación: el líder de la nube pública rechaza
/// peticiones sin clave, así que el fallo se adelanta a la red.
pub fn preflight_api_key(
    endpoint_plan: &EndpointPlan,
    api_key: Option<&str>,
) -> Result<(), DispatchFault> {
    let key_is_absent = api_key.map(str::trim).map_or(true, str::is_empty);
    if key_is_absent && endpoint_plan.leader_uri.as_str() == PUBLIC_CLOUD_ENDPOINT {
        return Err(DispatchFault::ApiKeyRequired(
            endpoint_plan.leader_uri.to_string(),
        ));
    }
    Ok(())
}

fn with_path_segments(base_uri: &Url, path_segments: &[String]) -> Url {
    let mut derived_uri = base_uri.clone();
    derived_uri.set_path(&path_segments.join("/"));
    derived_uri
}
