//! HTTP client for the hosted storage and auth service.

use once_cell::sync::Lazy;
use serde::Deserialize;
use serde_json::json;

use crate::workout::{
    resolve_exercise_type, ExerciseType, ExerciseTypeAction, NewWorkout, Workout, WorkoutRow,
};

static AGENT: Lazy<ureq::Agent> = Lazy::new(ureq::Agent::new);

/// Determine the API key to use for storage requests.
///
/// If the `FITTRACK_API_KEY` environment variable is set, its value takes
/// precedence over any key provided in the application settings.
pub fn resolve_api_key(settings_key: Option<&str>) -> Option<String> {
    std::env::var("FITTRACK_API_KEY")
        .ok()
        .or_else(|| settings_key.map(|s| s.to_string()))
}

/// Same precedence rule for the session access token, via
/// `FITTRACK_ACCESS_TOKEN`.
pub fn resolve_access_token(settings_token: Option<&str>) -> Option<String> {
    std::env::var("FITTRACK_ACCESS_TOKEN")
        .ok()
        .or_else(|| settings_token.map(|s| s.to_string()))
}

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    Validation(String),
    Transport(Box<dyn std::error::Error + Send + Sync>),
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::NotFound(body) => write!(f, "not found: {body}"),
            ApiError::Validation(body) => write!(f, "rejected by the storage service: {body}"),
            ApiError::Transport(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::NotFound(_) | ApiError::Validation(_) => None,
            ApiError::Transport(e) => Some(&**e),
        }
    }
}

fn transport(err: impl std::error::Error + Send + Sync + 'static) -> ApiError {
    ApiError::Transport(Box::new(err))
}

fn convert_error(err: ureq::Error) -> ApiError {
    match err {
        ureq::Error::Status(404, response) => {
            ApiError::NotFound(response.into_string().unwrap_or_default())
        }
        ureq::Error::Status(400 | 422, response) => {
            let body = response.into_string().unwrap_or_default();
            // PostgREST reports a missing table as 42P01 "relation does not
            // exist" rather than a plain 404.
            if body.contains("42P01") || body.contains("does not exist") {
                ApiError::NotFound(body)
            } else {
                ApiError::Validation(body)
            }
        }
        ureq::Error::Status(code, response) => ApiError::Transport(
            format!(
                "unexpected status {code}: {}",
                response.into_string().unwrap_or_default()
            )
            .into(),
        ),
        e => ApiError::Transport(Box::new(e)),
    }
}

/// Authenticated user as reported by the auth endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Session {
    #[serde(rename = "id")]
    pub user_id: String,
    pub email: String,
}

/// Client for the PostgREST-style storage service. Cheap to clone; clones
/// share the underlying agent.
#[derive(Debug, Clone)]
pub struct StorageClient {
    base_url: String,
    api_key: String,
    access_token: String,
}

impl StorageClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            api_key: api_key.into(),
            access_token: access_token.into(),
        }
    }

    fn request(&self, method: &str, path: &str) -> ureq::Request {
        AGENT
            .request(method, &format!("{}{path}", self.base_url))
            .set("apikey", &self.api_key)
            .set("Authorization", &format!("Bearer {}", self.access_token))
            .set("Accept", "application/json")
    }

    /// Fetch all workouts for `owner`, newest first.
    ///
    /// A missing table is a deployment-time precondition, not a fault: any
    /// `NotFound` on this read is reported as an empty list.
    pub fn list_workouts(&self, owner: &str) -> Result<Vec<Workout>, ApiError> {
        let path = format!("/rest/v1/workouts?user_id=eq.{owner}&order=date.desc");
        match self.request("GET", &path).call() {
            Ok(response) => {
                let body = response.into_string().map_err(transport)?;
                let rows: Vec<WorkoutRow> = serde_json::from_str(&body).map_err(transport)?;
                Ok(rows.into_iter().filter_map(Workout::from_row).collect())
            }
            Err(err) => match convert_error(err) {
                ApiError::NotFound(body) => {
                    log::warn!("workouts table not available yet, treating as empty: {body}");
                    Ok(Vec::new())
                }
                other => Err(other),
            },
        }
    }

    pub fn create_workout(&self, new: &NewWorkout) -> Result<Workout, ApiError> {
        let response = self
            .request("POST", "/rest/v1/workouts")
            .set("Prefer", "return=representation")
            .send_json(new)
            .map_err(convert_error)?;
        let body = response.into_string().map_err(transport)?;
        let rows: Vec<WorkoutRow> = serde_json::from_str(&body).map_err(transport)?;
        rows.into_iter()
            .next()
            .and_then(Workout::from_row)
            .ok_or_else(|| ApiError::Transport("create returned no usable row".into()))
    }

    /// Resolve the exercise catalog per the submit rule, then create the
    /// gym workout record.
    pub fn create_gym_workout(&self, new: &NewWorkout) -> Result<Workout, ApiError> {
        self.sync_exercise_catalog(new)?;
        self.create_workout(new)
    }

    pub fn update_workout(&self, id: &str, new: &NewWorkout) -> Result<(), ApiError> {
        self.request("PATCH", &format!("/rest/v1/workouts?id=eq.{id}"))
            .send_json(new)
            .map_err(convert_error)?;
        Ok(())
    }

    /// Edits run through the same catalog rule as creates, so a renamed
    /// exercise still ends up in the catalog.
    pub fn update_gym_workout(&self, id: &str, new: &NewWorkout) -> Result<(), ApiError> {
        self.sync_exercise_catalog(new)?;
        self.update_workout(id, new)
    }

    fn sync_exercise_catalog(&self, new: &NewWorkout) -> Result<(), ApiError> {
        if let Some(exercise) = new.exercise.as_deref() {
            let types = self.list_exercise_types(&new.user_id)?;
            match resolve_exercise_type(&types, exercise, new.muscle_group.as_deref()) {
                ExerciseTypeAction::Create { name, muscle_group } => {
                    self.create_exercise_type(&new.user_id, &name, muscle_group.as_deref())?;
                }
                ExerciseTypeAction::UpdateGroup { id, muscle_group } => {
                    self.update_exercise_type(&id, &muscle_group)?;
                }
                ExerciseTypeAction::Keep { .. } => {}
            }
        }
        Ok(())
    }

    pub fn delete_workout(&self, id: &str) -> Result<(), ApiError> {
        self.request("DELETE", &format!("/rest/v1/workouts?id=eq.{id}"))
            .call()
            .map_err(convert_error)?;
        Ok(())
    }

    pub fn list_exercise_types(&self, owner: &str) -> Result<Vec<ExerciseType>, ApiError> {
        let path = format!("/rest/v1/exercise_types?user_id=eq.{owner}&order=name.asc");
        match self.request("GET", &path).call() {
            Ok(response) => {
                let body = response.into_string().map_err(transport)?;
                serde_json::from_str(&body).map_err(transport)
            }
            Err(err) => match convert_error(err) {
                ApiError::NotFound(body) => {
                    log::warn!("exercise_types table not available yet, treating as empty: {body}");
                    Ok(Vec::new())
                }
                other => Err(other),
            },
        }
    }

    pub fn create_exercise_type(
        &self,
        owner: &str,
        name: &str,
        muscle_group: Option<&str>,
    ) -> Result<ExerciseType, ApiError> {
        let response = self
            .request("POST", "/rest/v1/exercise_types")
            .set("Prefer", "return=representation")
            .send_json(json!({
                "user_id": owner,
                "name": name,
                "muscle_group": muscle_group,
            }))
            .map_err(convert_error)?;
        let body = response.into_string().map_err(transport)?;
        let types: Vec<ExerciseType> = serde_json::from_str(&body).map_err(transport)?;
        types
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::Transport("create returned no usable row".into()))
    }

    pub fn update_exercise_type(&self, id: &str, muscle_group: &str) -> Result<(), ApiError> {
        self.request("PATCH", &format!("/rest/v1/exercise_types?id=eq.{id}"))
            .send_json(json!({ "muscle_group": muscle_group }))
            .map_err(convert_error)?;
        Ok(())
    }

    /// Look up the authenticated user; an unauthorized token means no
    /// session rather than an error.
    pub fn current_session(&self) -> Result<Option<Session>, ApiError> {
        match self.request("GET", "/auth/v1/user").call() {
            Ok(response) => {
                let body = response.into_string().map_err(transport)?;
                let session: Session = serde_json::from_str(&body).map_err(transport)?;
                Ok(Some(session))
            }
            Err(ureq::Error::Status(401, _)) => Ok(None),
            Err(err) => Err(convert_error(err)),
        }
    }

    pub fn sign_out(&self) -> Result<(), ApiError> {
        self.request("POST", "/auth/v1/logout")
            .call()
            .map_err(convert_error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workout::WorkoutDetails;
    use chrono::{TimeZone, Utc};
    use httpmock::prelude::*;
    use serde_json::json;
    use std::sync::Mutex;

    static ENV_MUTEX: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    fn client(server: &MockServer) -> StorageClient {
        StorageClient::new(server.base_url(), "key", "token")
    }

    fn gym_payload() -> NewWorkout {
        NewWorkout {
            user_id: "u1".into(),
            kind: "gym".into(),
            exercise: Some("Bench Press".into()),
            muscle_group: Some("back".into()),
            sets: Some(3),
            reps: Some(12),
            weight: Some(80.0),
            distance: None,
            pace: None,
            duration: 45,
            calories: None,
            date: Utc.with_ymd_and_hms(2024, 5, 4, 0, 0, 0).unwrap(),
        }
    }

    fn workout_row(id: &str) -> serde_json::Value {
        json!({
            "id": id,
            "user_id": "u1",
            "type": "gym",
            "exercise": "Bench Press",
            "muscle_group": "back",
            "sets": 3,
            "reps": 12,
            "weight": 80.0,
            "duration": 45,
            "date": "2024-05-04T18:30:00Z",
        })
    }

    #[test]
    fn list_workouts_parses_and_skips_malformed_rows() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(GET)
                .path("/rest/v1/workouts")
                .query_param("user_id", "eq.u1")
                .query_param("order", "date.desc")
                .header("apikey", "key")
                .header("Authorization", "Bearer token");
            then.status(200).json_body(json!([
                workout_row("w1"),
                // No date: skipped, not an error.
                { "id": "w2", "user_id": "u1", "type": "run", "duration": 30 },
            ]));
        });

        let workouts = client(&server).list_workouts("u1").unwrap();
        assert_eq!(workouts.len(), 1);
        assert_eq!(workouts[0].id, "w1");
        m.assert();
    }

    #[test]
    fn missing_table_reads_as_empty_list() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(GET).path("/rest/v1/workouts");
            then.status(404)
                .body(r#"{"code":"42P01","message":"relation \"public.workouts\" does not exist"}"#);
        });

        let workouts = client(&server).list_workouts("u1").unwrap();
        assert!(workouts.is_empty());
        m.assert();
    }

    #[test]
    fn server_failure_is_a_transport_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/rest/v1/workouts");
            then.status(500).body("boom");
        });

        let err = client(&server).list_workouts("u1").unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
    }

    #[test]
    fn delete_not_found_stays_an_error() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(httpmock::Method::DELETE)
                .path("/rest/v1/workouts")
                .query_param("id", "eq.w1");
            then.status(404).body("gone");
        });

        let err = client(&server).delete_workout("w1").unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
        m.assert();
    }

    #[test]
    fn create_workout_returns_assigned_id() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(POST)
                .path("/rest/v1/workouts")
                .header("Prefer", "return=representation");
            then.status(201).json_body(json!([workout_row("w9")]));
        });

        let created = client(&server).create_workout(&gym_payload()).unwrap();
        assert_eq!(created.id, "w9");
        assert!(matches!(created.details, WorkoutDetails::Gym { .. }));
        m.assert();
    }

    #[test]
    fn gym_submit_updates_existing_exercise_type_in_place() {
        let server = MockServer::start();
        // Stored catalog has "bench press" with a differing group.
        let list_types = server.mock(|when, then| {
            when.method(GET)
                .path("/rest/v1/exercise_types")
                .query_param("user_id", "eq.u1");
            then.status(200).json_body(json!([
                { "id": "et1", "user_id": "u1", "name": "bench press", "muscle_group": "chest" },
            ]));
        });
        let patch_type = server.mock(|when, then| {
            when.method(httpmock::Method::PATCH)
                .path("/rest/v1/exercise_types")
                .query_param("id", "eq.et1")
                .json_body(json!({ "muscle_group": "back" }));
            then.status(204);
        });
        let create_type = server.mock(|when, then| {
            when.method(POST).path("/rest/v1/exercise_types");
            then.status(201).json_body(json!([]));
        });
        let post_workout = server.mock(|when, then| {
            when.method(POST).path("/rest/v1/workouts");
            then.status(201).json_body(json!([workout_row("w1")]));
        });

        let created = client(&server).create_gym_workout(&gym_payload()).unwrap();
        assert_eq!(created.id, "w1");
        list_types.assert();
        patch_type.assert();
        post_workout.assert();
        create_type.assert_hits(0);
    }

    #[test]
    fn gym_edit_keeps_catalog_in_sync() {
        let server = MockServer::start();
        // Editing to a name absent from the catalog creates the entry before
        // the record is replaced.
        let list_types = server.mock(|when, then| {
            when.method(GET).path("/rest/v1/exercise_types");
            then.status(200).json_body(json!([]));
        });
        let create_type = server.mock(|when, then| {
            when.method(POST).path("/rest/v1/exercise_types");
            then.status(201).json_body(json!([
                { "id": "et9", "user_id": "u1", "name": "Bench Press", "muscle_group": "back" },
            ]));
        });
        let patch_workout = server.mock(|when, then| {
            when.method(httpmock::Method::PATCH)
                .path("/rest/v1/workouts")
                .query_param("id", "eq.w1");
            then.status(204);
        });

        client(&server).update_gym_workout("w1", &gym_payload()).unwrap();
        list_types.assert();
        create_type.assert();
        patch_workout.assert();
    }

    #[test]
    fn gym_submit_creates_unknown_exercise_type() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/rest/v1/exercise_types");
            then.status(200).json_body(json!([]));
        });
        let create_type = server.mock(|when, then| {
            when.method(POST)
                .path("/rest/v1/exercise_types")
                .json_body(json!({
                    "user_id": "u1",
                    "name": "Bench Press",
                    "muscle_group": "back",
                }));
            then.status(201).json_body(json!([
                { "id": "et2", "user_id": "u1", "name": "Bench Press", "muscle_group": "back" },
            ]));
        });
        server.mock(|when, then| {
            when.method(POST).path("/rest/v1/workouts");
            then.status(201).json_body(json!([workout_row("w1")]));
        });

        client(&server).create_gym_workout(&gym_payload()).unwrap();
        create_type.assert();
    }

    #[test]
    fn unauthorized_session_lookup_means_no_session() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/auth/v1/user");
            then.status(401).body("expired");
        });

        let session = client(&server).current_session().unwrap();
        assert_eq!(session, None);
    }

    #[test]
    fn session_lookup_returns_user() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/auth/v1/user");
            then.status(200)
                .json_body(json!({ "id": "u1", "email": "user@example.com" }));
        });

        let session = client(&server).current_session().unwrap().unwrap();
        assert_eq!(session.user_id, "u1");
        assert_eq!(session.email, "user@example.com");
    }

    #[test]
    fn env_var_overrides_settings_key() {
        let _guard = ENV_MUTEX.lock().unwrap();
        unsafe {
            std::env::set_var("FITTRACK_API_KEY", "forced");
        }

        let key = resolve_api_key(Some("settings_key"));
        assert_eq!(key.as_deref(), Some("forced"));

        unsafe {
            std::env::remove_var("FITTRACK_API_KEY");
        }
        assert_eq!(resolve_api_key(Some("settings_key")).as_deref(), Some("settings_key"));
        assert_eq!(resolve_access_token(None), None);
    }
}
