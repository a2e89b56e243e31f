use super::CommandRunner;
use crate::auth;
use crate::cli;
use crate::storage::Storage;
use crate::types::UserForm;
use anyhow::{Context, Result};
use chrono::Utc;

impl CommandRunner for cli::UserCmd {
    fn run<S: Storage>(&self, storage: &S) -> Result<()> {
        match self {
            cli::UserCmd::Create {
                email,
                password,
                first_name,
                last_name,
                admin,
                api,
            } => {
                let form = UserForm {
                    email: email.clone(),
                    password: password.clone(),
                    first_name: first_name.clone(),
                    last_name: last_name.clone(),
                    is_admin: *admin,
                    can_access_api: *api,
                };
                let mut user = auth::new_user(&form, 0, Utc::now())?;
                user.id = storage.insert_user(&user).context("inserting user")?;
                log::info!(
                    "👤 created user {} id={} admin={} api={}",
                    user.email,
                    user.id,
                    user.is_admin,
                    user.can_access_api
                );
                Ok(())
            }
            cli::UserCmd::List => {
                for user in storage.list_users().context("listing users")? {
                    println!(
                        "{}\t{}\tactive={}\tadmin={}\tapi={}",
                        user.id, user.email, user.is_active, user.is_admin, user.can_access_api
                    );
                }
                Ok(())
            }
        }
    }
}
