use chrono::{Datelike, NaiveDate};
use uuid::Uuid;

use super::{Service, ServiceError, ServiceResult};
use crate::calendar::{render_habit_heatmap, today_utc};
use crate::domain::{
    normalize_log_value, validate_color_hue, validate_habit_name, validate_log_value, Habit,
    HabitLog,
};

#[derive(Debug, Clone)]
pub struct NewHabit {
    pub name: String,
    pub color_hue: i32,
    pub is_boolean: bool,
}

/// A habit edit; `is_boolean` keeps its current value when absent
#[derive(Debug, Clone)]
pub struct HabitChanges {
    pub name: String,
    pub color_hue: i32,
    pub is_boolean: Option<bool>,
}

impl Service {
    pub async fn create_habit(&self, user_id: Uuid, habit: NewHabit) -> ServiceResult<Habit> {
        let name = validate_habit_name(&habit.name)?;
        validate_color_hue(habit.color_hue)?;

        let habit = self
            .repo
            .create_habit(user_id, &name, habit.color_hue, habit.is_boolean)
            .await?;

        tracing::debug!(habit_id = %habit.id, "Created habit {}", habit.name);
        Ok(habit)
    }

    /// Load a habit and check that `user_id` owns it
    async fn owned_habit(&self, user_id: Uuid, habit_id: Uuid) -> ServiceResult<Habit> {
        let habit = self
            .repo
            .get_habit(habit_id)
            .await?
            .ok_or(ServiceError::HabitNotFound)?;

        if habit.user_id != user_id {
            return Err(ServiceError::AccessDenied);
        }
        Ok(habit)
    }

    pub async fn update_habit(
        &self,
        user_id: Uuid,
        habit_id: Uuid,
        changes: HabitChanges,
    ) -> ServiceResult<Habit> {
        let name = validate_habit_name(&changes.name)?;
        validate_color_hue(changes.color_hue)?;

        let current = self.owned_habit(user_id, habit_id).await?;
        let is_boolean = changes.is_boolean.unwrap_or(current.is_boolean);

        Ok(self
            .repo
            .update_habit(habit_id, &name, changes.color_hue, is_boolean)
            .await?)
    }

    pub async fn delete_habit(&self, user_id: Uuid, habit_id: Uuid) -> ServiceResult<()> {
        self.owned_habit(user_id, habit_id).await?;
        self.repo.delete_habit(habit_id).await?;
        Ok(())
    }

    /// Record `value` for `date`, replacing any earlier entry for that day
    pub async fn log_habit(
        &self,
        user_id: Uuid,
        habit_id: Uuid,
        date: NaiveDate,
        value: i32,
    ) -> ServiceResult<HabitLog> {
        validate_log_value(value)?;
        let habit = self.owned_habit(user_id, habit_id).await?;

        let value = normalize_log_value(habit.is_boolean, value);
        Ok(self.repo.upsert_log(habit_id, date, value).await?)
    }

    /// SVG heatmap of one habit; the current UTC year when `year` is absent
    pub async fn habit_heatmap(&self, habit_id: Uuid, year: Option<i32>) -> ServiceResult<String> {
        let habit = self
            .repo
            .habit_with_logs(habit_id)
            .await?
            .ok_or(ServiceError::HabitNotFound)?;

        let today = today_utc();
        let year = year.unwrap_or_else(|| today.year());
        Ok(render_habit_heatmap(&habit, year, today))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testing::{service, signup};

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn read() -> NewHabit {
        NewHabit {
            name: "  Read  ".to_string(),
            color_hue: 200,
            is_boolean: true,
        }
    }

    #[tokio::test]
    async fn test_create_habit_trims_and_validates() {
        let (service, _dir) = service();
        let alice = signup(&service, "alice").await;

        let habit = service.create_habit(alice.id, read()).await.unwrap();
        assert_eq!(habit.name, "Read");

        let err = service
            .create_habit(
                alice.id,
                NewHabit {
                    color_hue: 400,
                    ..read()
                },
            )
            .await
            .unwrap_err();
        match err {
            ServiceError::Validation(field) => assert_eq!(field.field, "colorHue"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_only_owner_mutates() {
        let (service, _dir) = service();
        let alice = signup(&service, "alice").await;
        let bob = signup(&service, "bob").await;
        let habit = service.create_habit(alice.id, read()).await.unwrap();

        let changes = HabitChanges {
            name: "Stolen".to_string(),
            color_hue: 1,
            is_boolean: None,
        };
        assert!(matches!(
            service.update_habit(bob.id, habit.id, changes.clone()).await,
            Err(ServiceError::AccessDenied)
        ));
        assert!(matches!(
            service.delete_habit(bob.id, habit.id).await,
            Err(ServiceError::AccessDenied)
        ));
        assert!(matches!(
            service.log_habit(bob.id, habit.id, ymd(2024, 1, 1), 1).await,
            Err(ServiceError::AccessDenied)
        ));

        let updated = service.update_habit(alice.id, habit.id, changes).await.unwrap();
        assert_eq!(updated.name, "Stolen");
        assert!(updated.is_boolean);

        service.delete_habit(alice.id, habit.id).await.unwrap();
        assert!(matches!(
            service.delete_habit(alice.id, habit.id).await,
            Err(ServiceError::HabitNotFound)
        ));
    }

    #[tokio::test]
    async fn test_log_habit_normalizes_boolean_values() {
        let (service, _dir) = service();
        let alice = signup(&service, "alice").await;
        let habit = service.create_habit(alice.id, read()).await.unwrap();

        let log = service
            .log_habit(alice.id, habit.id, ymd(2024, 6, 1), 5)
            .await
            .unwrap();
        assert_eq!(log.value, 1);

        assert!(matches!(
            service.log_habit(alice.id, habit.id, ymd(2024, 6, 1), -1).await,
            Err(ServiceError::Validation(_))
        ));

        let graded = service
            .create_habit(
                alice.id,
                NewHabit {
                    name: "Pushups".to_string(),
                    color_hue: 10,
                    is_boolean: false,
                },
            )
            .await
            .unwrap();
        let log = service
            .log_habit(alice.id, graded.id, ymd(2024, 6, 1), 30)
            .await
            .unwrap();
        assert_eq!(log.value, 30);
    }

    #[tokio::test]
    async fn test_toggle_off_hides_log() {
        let (service, _dir) = service();
        let alice = signup(&service, "alice").await;
        let habit = service.create_habit(alice.id, read()).await.unwrap();

        service
            .log_habit(alice.id, habit.id, ymd(2024, 6, 1), 1)
            .await
            .unwrap();
        service
            .log_habit(alice.id, habit.id, ymd(2024, 6, 1), 0)
            .await
            .unwrap();

        let profile = service.get_profile_data("alice", None).await.unwrap();
        assert!(profile.habits[0].logs.is_empty());
    }

    #[tokio::test]
    async fn test_heatmap() {
        let (service, _dir) = service();
        let alice = signup(&service, "alice").await;
        let habit = service.create_habit(alice.id, read()).await.unwrap();
        service
            .log_habit(alice.id, habit.id, ymd(2023, 6, 1), 1)
            .await
            .unwrap();

        let svg = service.habit_heatmap(habit.id, Some(2023)).await.unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("<title>Read 2023</title>"));

        assert!(matches!(
            service.habit_heatmap(Uuid::new_v4(), None).await,
            Err(ServiceError::HabitNotFound)
        ));
    }
}
