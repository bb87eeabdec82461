use crate::entities::{sensor_data, sensors};
use crate::{impl_from_entity, impl_to_active_model};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const NAME_MAX_LEN: usize = 255;
pub const DESCRIPTION_MAX_LEN: usize = 255;
pub const UNIT_MAX_LEN: usize = 50;

/// A single rejected field on an incoming request.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

fn check_len(errors: &mut Vec<FieldError>, field: &str, value: &str, max: usize) {
    let len = value.chars().count();
    if len > max {
        errors.push(FieldError::new(
            field,
            format!("ensure this value has at most {} characters (got {})", max, len),
        ));
    }
}

const FIELD_REQUIRED: &str = "field required";

/// Shape checks run on a raw JSON object before it is deserialized, so that
/// every missing or mistyped field is reported together.
pub trait BodySchema: DeserializeOwned {
    fn check(object: &Map<String, Value>) -> Vec<FieldError>;
}

fn require_str(errors: &mut Vec<FieldError>, object: &Map<String, Value>, field: &str) {
    match object.get(field) {
        None | Some(Value::Null) => errors.push(FieldError::new(field, FIELD_REQUIRED)),
        Some(Value::String(_)) => {}
        Some(_) => errors.push(FieldError::new(field, "value is not a valid string")),
    }
}

fn require_i32(errors: &mut Vec<FieldError>, object: &Map<String, Value>, field: &str) {
    match object.get(field) {
        None | Some(Value::Null) => errors.push(FieldError::new(field, FIELD_REQUIRED)),
        Some(Value::Number(n)) if n.as_i64().and_then(|v| i32::try_from(v).ok()).is_some() => {}
        Some(_) => errors.push(FieldError::new(field, "value is not a valid integer")),
    }
}

fn require_number(errors: &mut Vec<FieldError>, object: &Map<String, Value>, field: &str) {
    match object.get(field) {
        None | Some(Value::Null) => errors.push(FieldError::new(field, FIELD_REQUIRED)),
        Some(Value::Number(_)) => {}
        Some(_) => errors.push(FieldError::new(field, "value is not a valid number")),
    }
}

// --- Sensors ---

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CreateSensor {
    pub name: String,
    pub description: String,
    pub unit: String,
}

impl CreateSensor {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        check_len(&mut errors, "name", &self.name, NAME_MAX_LEN);
        check_len(&mut errors, "description", &self.description, DESCRIPTION_MAX_LEN);
        check_len(&mut errors, "unit", &self.unit, UNIT_MAX_LEN);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl BodySchema for CreateSensor {
    fn check(object: &Map<String, Value>) -> Vec<FieldError> {
        let mut errors = Vec::new();
        require_str(&mut errors, object, "name");
        require_str(&mut errors, object, "description");
        require_str(&mut errors, object, "unit");
        errors
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Sensor {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub unit: String,
}

impl_from_entity!(
    model = Sensor,
    entity = sensors::Model,
    fields = [id, name, description, unit]
);

impl_to_active_model!(
    request = CreateSensor,
    active = sensors::ActiveModel,
    fields = [name, description, unit]
);

// --- Sensor readings ---

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CreateSensorData {
    pub sensor_id: i32,
    pub value: f64,
}

impl CreateSensorData {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        if self.value.is_finite() {
            Ok(())
        } else {
            Err(vec![FieldError::new("value", "value must be a finite number")])
        }
    }
}

impl BodySchema for CreateSensorData {
    fn check(object: &Map<String, Value>) -> Vec<FieldError> {
        let mut errors = Vec::new();
        require_i32(&mut errors, object, "sensor_id");
        require_number(&mut errors, object, "value");
        errors
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SensorData {
    pub id: i32,
    pub sensor_id: i32,
    pub value: f64,
    pub timestamp: DateTime<Utc>,
}

impl_from_entity!(
    model = SensorData,
    entity = sensor_data::Model,
    fields = [id, sensor_id, value, timestamp]
);

impl_to_active_model!(
    request = CreateSensorData,
    active = sensor_data::ActiveModel,
    fields = [sensor_id, value],
    extra = { timestamp: Utc::now() }
);

// --- Notifications ---

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct NotifyRequest {
    pub body: String,
}

impl NotifyRequest {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        if self.body.trim().is_empty() {
            Err(vec![FieldError::new("body", "message body must not be empty")])
        } else {
            Ok(())
        }
    }
}

impl BodySchema for NotifyRequest {
    fn check(object: &Map<String, Value>) -> Vec<FieldError> {
        let mut errors = Vec::new();
        require_str(&mut errors, object, "body");
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversion::{FromEntity, ToActiveModel};
    use sea_orm::ActiveValue;

    fn sensor_request() -> CreateSensor {
        CreateSensor {
            name: "greenhouse-1".to_string(),
            description: "Soil moisture sensor".to_string(),
            unit: "%".to_string(),
        }
    }

    #[test]
    fn valid_sensor_passes() {
        assert!(sensor_request().validate().is_ok());
    }

    #[test]
    fn every_oversized_field_is_reported() {
        let request = CreateSensor {
            name: "n".repeat(256),
            description: "ok".to_string(),
            unit: "u".repeat(51),
        };
        let errors = request.validate().unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["name", "unit"]);
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        let request = CreateSensor {
            unit: "°".repeat(50),
            ..sensor_request()
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn non_finite_reading_is_rejected() {
        let reading = CreateSensorData {
            sensor_id: 1,
            value: f64::NAN,
        };
        assert_eq!(reading.validate().unwrap_err()[0].field, "value");
    }

    #[test]
    fn blank_notification_is_rejected() {
        let request = NotifyRequest {
            body: "   ".to_string(),
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn schema_reports_all_missing_fields() {
        let object = serde_json::json!({"name": "x"});
        let errors = CreateSensor::check(object.as_object().unwrap());
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["description", "unit"]);
        assert!(errors.iter().all(|e| e.message == "field required"));
    }

    #[test]
    fn schema_reports_wrong_types() {
        let object = serde_json::json!({"sensor_id": "abc", "value": true});
        let errors = CreateSensorData::check(object.as_object().unwrap());
        assert_eq!(
            errors,
            vec![
                FieldError::new("sensor_id", "value is not a valid integer"),
                FieldError::new("value", "value is not a valid number"),
            ]
        );
    }

    #[test]
    fn schema_rejects_out_of_range_sensor_id() {
        let object = serde_json::json!({"sensor_id": 5_000_000_000i64, "value": 1});
        let errors = CreateSensorData::check(object.as_object().unwrap());
        assert_eq!(errors[0].field, "sensor_id");
    }

    #[test]
    fn sensor_from_row() {
        let row = sensors::Model {
            id: 7,
            name: "boiler".to_string(),
            description: "Outlet temperature".to_string(),
            unit: "C".to_string(),
        };
        let sensor = Sensor::from_entity(&row);
        assert_eq!(sensor.id, 7);
        assert_eq!(sensor.unit, "C");
    }

    #[test]
    fn create_request_leaves_id_unset() {
        let active: sensors::ActiveModel = sensor_request().to_active_model();
        assert_eq!(active.id, ActiveValue::NotSet);
        assert_eq!(active.name, ActiveValue::Set("greenhouse-1".to_string()));
    }

    #[test]
    fn reading_gets_server_timestamp() {
        let before = Utc::now();
        let active: sensor_data::ActiveModel = CreateSensorData {
            sensor_id: 3,
            value: 21.5,
        }
        .to_active_model();
        match active.timestamp {
            ActiveValue::Set(ts) => assert!(ts >= before),
            other => panic!("timestamp not set: {:?}", other),
        }
    }
}
