use super::extract::ValidJson;
use crate::conversion::{FromEntity, ToActiveModel};
use crate::db::with_transaction;
use crate::entities::{sensor_data, sensors};
use crate::error::AppError;
use crate::models::{CreateSensor, CreateSensorData, NotifyRequest, Sensor, SensorData};
use crate::notify::MessageReceipt;
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

pub const DEFAULT_READINGS_LIMIT: u64 = 100;
pub const MAX_READINGS_LIMIT: u64 = 1000;

#[derive(Debug, Deserialize)]
pub struct ItemQuery {
    pub q: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ItemResponse {
    pub item_id: i64,
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReadingsQuery {
    pub limit: Option<u64>,
}

/// Requested page size, defaulted and clamped to `1..=MAX_READINGS_LIMIT`.
pub fn readings_limit(requested: Option<u64>) -> u64 {
    requested
        .unwrap_or(DEFAULT_READINGS_LIMIT)
        .clamp(1, MAX_READINGS_LIMIT)
}

fn parse_path_int<T: std::str::FromStr>(field: &str, raw: &str) -> Result<T, AppError> {
    raw.parse::<T>()
        .map_err(|_| AppError::invalid("path", field, "value is not a valid integer"))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

pub async fn ping() -> Json<Value> {
    Json(json!({ "ping": "pong!" }))
}

pub async fn read_item(
    Path(item_id): Path<String>,
    Query(query): Query<ItemQuery>,
) -> Result<Json<ItemResponse>, AppError> {
    let item_id = parse_path_int("item_id", &item_id)?;
    Ok(Json(ItemResponse { item_id, q: query.q }))
}

// --- Sensors ---

pub async fn create_sensor(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<CreateSensor>,
) -> Result<(StatusCode, Json<Sensor>), AppError> {
    request.validate().map_err(AppError::from_body)?;

    let row = with_transaction(&state.db_pool, |txn| {
        let active: sensors::ActiveModel = request.to_active_model();
        Box::pin(async move { Ok(active.insert(txn).await?) })
    })
    .await?;

    info!(sensor_id = row.id, name = %row.name, "sensor created");
    Ok((StatusCode::CREATED, Json(Sensor::from_entity(&row))))
}

pub async fn list_sensors(State(state): State<AppState>) -> Result<Json<Vec<Sensor>>, AppError> {
    let rows = sensors::Entity::find()
        .order_by_asc(sensors::Column::Id)
        .all(&state.db_pool)
        .await?;
    Ok(Json(rows.iter().map(Sensor::from_entity).collect()))
}

pub async fn get_sensor(
    State(state): State<AppState>,
    Path(sensor_id): Path<String>,
) -> Result<Json<Sensor>, AppError> {
    let sensor_id: i32 = parse_path_int("sensor_id", &sensor_id)?;
    let row = sensors::Entity::find_by_id(sensor_id)
        .one(&state.db_pool)
        .await?
        .ok_or_else(|| AppError::not_found("sensor", sensor_id))?;
    Ok(Json(Sensor::from_entity(&row)))
}

// --- Readings ---

pub async fn create_sensor_data(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<CreateSensorData>,
) -> Result<(StatusCode, Json<SensorData>), AppError> {
    request.validate().map_err(AppError::from_body)?;

    let row = with_transaction(&state.db_pool, |txn| {
        let sensor_id = request.sensor_id;
        let active: sensor_data::ActiveModel = request.to_active_model();
        Box::pin(async move {
            if sensors::Entity::find_by_id(sensor_id).one(txn).await?.is_none() {
                return Err(AppError::not_found("sensor", sensor_id));
            }
            Ok(active.insert(txn).await?)
        })
    })
    .await?;

    Ok((StatusCode::CREATED, Json(SensorData::from_entity(&row))))
}

/// Readings for one sensor, newest first.
pub async fn list_sensor_data(
    State(state): State<AppState>,
    Path(sensor_id): Path<String>,
    Query(query): Query<ReadingsQuery>,
) -> Result<Json<Vec<SensorData>>, AppError> {
    let sensor_id: i32 = parse_path_int("sensor_id", &sensor_id)?;
    let limit = readings_limit(query.limit);

    if sensors::Entity::find_by_id(sensor_id)
        .one(&state.db_pool)
        .await?
        .is_none()
    {
        return Err(AppError::not_found("sensor", sensor_id));
    }

    let rows = sensor_data::Entity::find()
        .filter(sensor_data::Column::SensorId.eq(sensor_id))
        .order_by_desc(sensor_data::Column::Timestamp)
        .order_by_desc(sensor_data::Column::Id)
        .limit(limit)
        .all(&state.db_pool)
        .await?;
    Ok(Json(rows.iter().map(SensorData::from_entity).collect()))
}

// --- Notifications ---

pub async fn notify(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<NotifyRequest>,
) -> Result<Json<MessageReceipt>, AppError> {
    request.validate().map_err(AppError::from_body)?;
    let receipt = state.notifier.send(&request.body).await?;
    info!(
        channel = state.notifier.channel(),
        sid = %receipt.sid,
        "notification sent"
    );
    Ok(Json(receipt))
}
