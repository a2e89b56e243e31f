use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub salt: String,
    #[serde(skip_serializing, default)]
    pub encrypted_password: String,
    pub sign_in_count: i64,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
    pub is_admin: bool,
    pub can_access_api: bool,
    pub current_ip_address: String,
    pub previous_ip_address: String,
    pub created_at: DateTime<Utc>,
    pub created_by: i64,
    pub updated_at: DateTime<Utc>,
    pub updated_by: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UserForm {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub can_access_api: bool,
}

/// Role and activity flags an administrator can toggle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UserFlag {
    Active(bool),
    Admin(bool),
    ApiAccess(bool),
}

impl User {
    pub fn new(
        form: &UserForm,
        salt: String,
        encrypted_password: String,
        creator_id: i64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: 0,
            email: form.email.trim().to_string(),
            salt,
            encrypted_password,
            sign_in_count: 0,
            first_name: form.first_name.clone(),
            last_name: form.last_name.clone(),
            is_active: true,
            is_admin: form.is_admin,
            can_access_api: form.can_access_api,
            current_ip_address: String::new(),
            previous_ip_address: String::new(),
            created_at: now,
            created_by: creator_id,
            updated_at: now,
            updated_by: creator_id,
        }
    }

    pub fn set_flag(&mut self, flag: UserFlag, by: i64, now: DateTime<Utc>) {
        match flag {
            UserFlag::Active(v) => self.is_active = v,
            UserFlag::Admin(v) => self.is_admin = v,
            UserFlag::ApiAccess(v) => self.can_access_api = v,
        }
        self.updated_at = now;
        self.updated_by = by;
    }

    /// Record a successful sign-in from `ip`.
    pub fn record_sign_in(&mut self, ip: &str, now: DateTime<Utc>) {
        self.sign_in_count += 1;
        self.previous_ip_address = std::mem::take(&mut self.current_ip_address);
        self.current_ip_address = ip.to_string();
        self.updated_at = now;
    }
}
