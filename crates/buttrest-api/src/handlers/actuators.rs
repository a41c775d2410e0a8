//! Actuator handlers
//!
//! One set of routes per actuator category. The listing and detail
//! handlers share a kind-parameterized implementation, and every category
//! reads its own collection.

use axum::extract::{Path, State};
use axum::Json;
use buttrest_core::{links, ActuatorKind};

use crate::command::{
    dispatch, CommandAck, CommandSchema, LinearCommand, RotateCommand, ScalarCommand,
    ValidatedCommand,
};
use crate::error::{ApiError, Resource};
use crate::registry::parse_index;
use crate::render::{render_actuator, ActuatorItem, Collection, Document, LdJson};
use crate::state::AppState;

type ListResponse = Result<LdJson<Collection<ActuatorItem>>, ApiError>;
type ItemResponse = Result<LdJson<Document<ActuatorItem>>, ApiError>;
type CommandResponse = Result<Json<CommandAck>, ApiError>;

fn list(state: &AppState, device_id: &str, kind: ActuatorKind) -> ListResponse {
    let device_id = parse_index(Resource::Device, device_id)?;
    let device = state.registry().device(device_id)?;

    Ok(LdJson(Collection::new(
        links::actuators(device_id, kind),
        device
            .actuators_of(kind)
            .iter()
            .map(|a| render_actuator(device_id, kind, a))
            .collect(),
    )))
}

fn get(state: &AppState, device_id: &str, actuator_id: &str, kind: ActuatorKind) -> ItemResponse {
    let device_id = parse_index(Resource::Device, device_id)?;
    let actuator_id = parse_index(Resource::Actuator(kind), actuator_id)?;
    let actuator = state.registry().actuator_of(device_id, kind, actuator_id)?;
    Ok(LdJson(Document::new(render_actuator(
        device_id, kind, &actuator,
    ))))
}

async fn command<C: CommandSchema>(state: &AppState, validated: ValidatedCommand<C>) -> CommandResponse {
    let client = state.registry().client()?;
    dispatch(
        client,
        validated.device_id,
        validated.actuator.index,
        validated.command.into_command(),
    )
    .await?;
    Ok(Json(CommandAck::ok()))
}

// =============================================================================
// Scalar actuators
// =============================================================================

/// GET /devices/{device_id}/actuators
pub async fn list_actuators(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
) -> ListResponse {
    list(&state, &device_id, ActuatorKind::Scalar)
}

/// GET /devices/{device_id}/actuators/{actuator_id}
pub async fn get_actuator(
    State(state): State<AppState>,
    Path((device_id, actuator_id)): Path<(String, String)>,
) -> ItemResponse {
    get(&state, &device_id, &actuator_id, ActuatorKind::Scalar)
}

/// POST /devices/{device_id}/actuators/{actuator_id}
pub async fn command_actuator(
    State(state): State<AppState>,
    validated: ValidatedCommand<ScalarCommand>,
) -> CommandResponse {
    command(&state, validated).await
}

// =============================================================================
// Linear actuators
// =============================================================================

/// GET /devices/{device_id}/linear_actuators
pub async fn list_linear_actuators(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
) -> ListResponse {
    list(&state, &device_id, ActuatorKind::Linear)
}

/// GET /devices/{device_id}/linear_actuators/{actuator_id}
pub async fn get_linear_actuator(
    State(state): State<AppState>,
    Path((device_id, actuator_id)): Path<(String, String)>,
) -> ItemResponse {
    get(&state, &device_id, &actuator_id, ActuatorKind::Linear)
}

/// POST /devices/{device_id}/linear_actuators/{actuator_id}
pub async fn command_linear_actuator(
    State(state): State<AppState>,
    validated: ValidatedCommand<LinearCommand>,
) -> CommandResponse {
    command(&state, validated).await
}

// =============================================================================
// Rotatory actuators
// =============================================================================

/// GET /devices/{device_id}/rotatory_actuators
pub async fn list_rotatory_actuators(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
) -> ListResponse {
    list(&state, &device_id, ActuatorKind::Rotatory)
}

/// GET /devices/{device_id}/rotatory_actuators/{actuator_id}
pub async fn get_rotatory_actuator(
    State(state): State<AppState>,
    Path((device_id, actuator_id)): Path<(String, String)>,
) -> ItemResponse {
    get(&state, &device_id, &actuator_id, ActuatorKind::Rotatory)
}

/// POST /devices/{device_id}/rotatory_actuators/{actuator_id}
pub async fn command_rotatory_actuator(
    State(state): State<AppState>,
    validated: ValidatedCommand<RotateCommand>,
) -> CommandResponse {
    command(&state, validated).await
}
