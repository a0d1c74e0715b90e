use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::options::Department;

/// Row of the `users` table. `name` and `department` stay empty until the
/// owner completes provisioning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub department: Option<Department>,
}

impl UserProfile {
    /// A profile is complete once both a non-blank name and a department are set.
    pub fn is_complete(&self) -> bool {
        let has_name = self
            .name
            .as_deref()
            .is_some_and(|name| !name.trim().is_empty());
        has_name && self.department.is_some()
    }
}

/// Owner columns joined onto every listed record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorSummary {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub department: Option<Department>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(name: Option<&str>, department: Option<Department>) -> UserProfile {
        UserProfile {
            id: Uuid::new_v4(),
            email: "taro@example-u.ac.jp".to_string(),
            name: name.map(str::to_string),
            department,
        }
    }

    #[test]
    fn test_complete_requires_name_and_department() {
        assert!(profile(Some("山田太郎"), Some(Department::Informatics)).is_complete());
        assert!(!profile(None, Some(Department::Informatics)).is_complete());
        assert!(!profile(Some("山田太郎"), None).is_complete());
        assert!(!profile(Some("   "), Some(Department::Management)).is_complete());
    }

    #[test]
    fn test_null_columns_deserialize_as_incomplete() {
        let row = serde_json::json!({
            "id": "6f1c7a8e-8a57-4d0e-9d1b-2b7f0f5f9c11",
            "email": "taro@example-u.ac.jp",
            "name": null,
            "department": "経営学部"
        });
        let profile: UserProfile = serde_json::from_value(row).unwrap();
        assert!(!profile.is_complete());
    }
}
