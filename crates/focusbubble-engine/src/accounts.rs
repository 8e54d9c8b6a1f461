//! Users, sign-in and the schedule store

use crate::Engine;
use focusbubble_core::{Error, NewSchedule, NewUser, Result, Schedule, User};
use tracing::{debug, info};

impl Engine {
    /// Verify an identity token and find or create the matching user
    pub async fn sign_in(&self, token: &str) -> Result<User> {
        let claims = self.verifier.verify(token).await?;
        let email = claims
            .email
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| Error::validation("identity token missing email"))?;

        let user = self
            .db
            .users()
            .get_or_create(&NewUser {
                email,
                name: claims.name,
                picture: claims.picture,
            })
            .await?;
        info!("User {} signed in", user.id);
        Ok(user)
    }

    /// Find or create a user by email without a token
    pub async fn create_user(&self, new: &NewUser) -> Result<User> {
        if new.email.trim().is_empty() {
            return Err(Error::validation("email must not be empty"));
        }
        self.db.users().get_or_create(new).await
    }

    pub async fn get_user(&self, user_id: i64) -> Result<User> {
        self.db
            .users()
            .get_by_id(user_id)
            .await?
            .ok_or(Error::UserNotFound(user_id))
    }

    pub(crate) async fn ensure_user(&self, user_id: i64) -> Result<()> {
        if self.db.users().exists(user_id).await? {
            Ok(())
        } else {
            Err(Error::UserNotFound(user_id))
        }
    }

    pub async fn create_schedule(&self, user_id: i64, new: &NewSchedule) -> Result<Schedule> {
        new.validate()?;
        self.ensure_user(user_id).await?;
        let schedule = self.db.schedules().insert(user_id, new, self.now()).await?;
        debug!("Created schedule {} for user {}", schedule.id, user_id);
        Ok(schedule)
    }

    pub async fn list_schedules(&self, user_id: i64) -> Result<Vec<Schedule>> {
        self.db.schedules().list_by_owner(user_id).await
    }

    /// Delete one of the user's schedules. Another user's schedule is reported
    /// as not found.
    pub async fn delete_schedule(&self, user_id: i64, schedule_id: i64) -> Result<()> {
        if self.db.schedules().delete(user_id, schedule_id).await? {
            debug!("Deleted schedule {} for user {}", schedule_id, user_id);
            Ok(())
        } else {
            Err(Error::ScheduleNotFound(schedule_id))
        }
    }
}
