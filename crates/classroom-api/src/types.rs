//! Record shapes exchanged with the backend
//!
//! Read records keep unknown fields in a flattened `extra` map, so newer
//! backend fields survive a round trip through the client untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// =============================================================================
// Read records
// =============================================================================

/// A user account as listed by `/users/` or `/students/`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Primary key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    /// Login name
    pub username: String,
    /// Email address
    #[serde(default)]
    pub email: String,
    /// Given name
    #[serde(default)]
    pub first_name: String,
    /// Family name
    #[serde(default)]
    pub last_name: String,
    /// Fields not modelled above
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A group of students owned by a teacher
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Group {
    /// Primary key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    /// Group name, unique per owner
    pub name: String,
    /// Owning teacher as sent by the backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<Value>,
    /// Members as sent by the backend
    #[serde(default)]
    pub users: Vec<Value>,
    /// Assigned tasks as sent by the backend
    #[serde(default)]
    pub tasks: Vec<Value>,
    /// Fields not modelled above
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Reference to a lookup row by its name (language, level)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedRef {
    /// Lookup name
    pub name: String,
}

impl NamedRef {
    /// Create a reference
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Account profile linking a user to its account type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Owning user, as serialized by the backend
    #[serde(default)]
    pub user: Option<Value>,
    /// Account type, as serialized by the backend
    #[serde(default, rename = "userType")]
    pub user_type: Option<Value>,
    /// Fields not modelled above
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A programming exercise
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    /// Primary key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    /// Title
    pub title: String,
    /// Task description
    #[serde(default)]
    pub content: String,
    /// Programming language
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<NamedRef>,
    /// Difficulty level
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<NamedRef>,
    /// Author as sent by the backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<Value>,
    /// Fields not modelled above
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// =============================================================================
// Write payloads
// =============================================================================

/// Account type chosen at registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserType {
    /// Solves tasks
    Student,
    /// Owns groups and exercises
    Teacher,
}

/// Registration payload for `POST /users/`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewUser {
    /// Login name
    pub username: String,
    /// Plain password
    pub password: String,
    /// Email address
    pub email: String,
    /// Given name
    pub firstname: String,
    /// Family name
    pub lastname: String,
    /// Account type
    #[serde(rename = "userType")]
    pub user_type: UserType,
}

/// Login payload for `POST /token/`
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    /// Login name
    pub username: String,
    /// Plain password
    pub password: String,
}

impl Credentials {
    /// Create credentials
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self { username: username.into(), password: password.into() }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Tokens issued by `POST /token/`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenPair {
    /// Bearer token for authorized endpoints
    pub access: String,
    /// Refresh token, unused by the client
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh: Option<String>,
}

/// Username reference used in group membership payloads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    /// Login name
    pub username: String,
}

impl UserRef {
    /// Create a reference
    pub fn new(username: impl Into<String>) -> Self {
        Self { username: username.into() }
    }
}

/// Payload for `POST /groups/`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGroup {
    /// Name of the new group
    pub group_name: String,
    /// Initial members
    #[serde(default)]
    pub selected_users: Vec<UserRef>,
}

/// Payload for `PUT /groups/{id}/`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupUpdate {
    /// Current name of the group
    pub old_name: String,
    /// New name of the group
    pub group_name: String,
    /// Members to add
    #[serde(default)]
    pub selected_users: Vec<UserRef>,
    /// Members to remove
    #[serde(default)]
    pub users_to_remove: Vec<UserRef>,
}

/// Payload for `POST /exercises/`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExercise {
    /// Title
    pub title: String,
    /// Task description
    pub content: String,
    /// Programming language
    pub language: NamedRef,
    /// Difficulty level
    pub level: NamedRef,
    /// Unit test definitions, passed through to the backend
    #[serde(default)]
    pub unit_tests: Vec<Value>,
}

/// Body of mutation responses
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Human-readable outcome
    #[serde(default)]
    pub message: String,
    /// Fields not modelled above
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Wrapper the group and exercise endpoints expect around write payloads
#[derive(Debug, Serialize)]
pub(crate) struct ParamsEnvelope<'a, T: Serialize> {
    pub params: &'a T,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_keeps_unknown_fields() {
        let user: User = serde_json::from_value(json!({
            "id": 3,
            "username": "alice",
            "email": "alice@example.com",
            "profile": {"userType": "Student"}
        }))
        .unwrap();

        assert_eq!(user.id, Some(3));
        assert_eq!(user.username, "alice");
        assert_eq!(user.first_name, "");
        assert_eq!(user.extra.get("profile"), Some(&json!({"userType": "Student"})));
    }

    #[test]
    fn test_group_defaults() {
        let group: Group = serde_json::from_value(json!({"name": "Algorithms"})).unwrap();
        assert_eq!(group.id, None);
        assert!(group.users.is_empty());
        assert!(group.tasks.is_empty());
    }

    #[test]
    fn test_exercise_named_refs() {
        let exercise: Exercise = serde_json::from_value(json!({
            "id": 9,
            "title": "FizzBuzz",
            "content": "Print numbers",
            "language": {"name": "Python"},
            "level": {"name": "Easy"}
        }))
        .unwrap();

        assert_eq!(exercise.language, Some(NamedRef::new("Python")));
        assert_eq!(exercise.level, Some(NamedRef::new("Easy")));
    }

    #[test]
    fn test_new_user_wire_names() {
        let user = NewUser {
            username: "bob".to_string(),
            password: "secret".to_string(),
            email: "bob@example.com".to_string(),
            firstname: "Bob".to_string(),
            lastname: "Builder".to_string(),
            user_type: UserType::Teacher,
        };

        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(value["userType"], "Teacher");
        assert_eq!(value["firstname"], "Bob");
    }

    #[test]
    fn test_group_payloads_are_camel_case() {
        let update = GroupUpdate {
            old_name: "A".to_string(),
            group_name: "B".to_string(),
            selected_users: vec![UserRef::new("alice")],
            users_to_remove: vec![UserRef::new("bob")],
        };

        let value = serde_json::to_value(&update).unwrap();
        assert_eq!(value["oldName"], "A");
        assert_eq!(value["groupName"], "B");
        assert_eq!(value["selectedUsers"][0]["username"], "alice");
        assert_eq!(value["usersToRemove"][0]["username"], "bob");
    }

    #[test]
    fn test_params_envelope() {
        let group = NewGroup { group_name: "A".to_string(), selected_users: vec![] };
        let value = serde_json::to_value(ParamsEnvelope { params: &group }).unwrap();
        assert_eq!(value, json!({"params": {"groupName": "A", "selectedUsers": []}}));
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let credentials = Credentials::new("alice", "hunter2");
        let debug = format!("{:?}", credentials);
        assert!(debug.contains("alice"));
        assert!(!debug.contains("hunter2"));
    }
}
