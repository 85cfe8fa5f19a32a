use crate::error::{SettlementError, SettlementResult};
use crate::respect::{award_points, PARTICIPATION_POINTS};
use crate::streak::{is_marked_today, mark, MarkOutcome};
use crate::unit_of_work::UnitOfWork;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter,
};
use som_db_entity::db::sea_orm_active_enums::{AttendanceKind, SurveyStatus};
use som_db_entity::db::survey::Entity as Survey;
use som_db_entity::db::survey_participant::{
    ActiveModel as ParticipantActiveModel, Column as ParticipantColumn,
    Entity as SurveyParticipant, Model as ParticipantModel,
};

#[derive(Clone, Debug, PartialEq)]
pub struct ParticipationOutcome {
    pub participant: ParticipantModel,
    /// `None` when the participation streak was already marked today.
    pub streak: Option<MarkOutcome>,
}

/// Records a user's answer to an ongoing survey and counts it toward the
/// participation streak.
pub async fn participate(
    uow: &mut UnitOfWork,
    survey_id: i32,
    user_id: i32,
    option_id: i32,
    now: i64,
) -> SettlementResult<ParticipationOutcome> {
    let survey = Survey::find_by_id(survey_id)
        .one(uow.conn())
        .await?
        .ok_or(SettlementError::SurveyNotFound(survey_id))?;
    if survey.status != SurveyStatus::Ongoing {
        return Err(SettlementError::SurveyNotOngoing(survey_id));
    }
    if survey.ending_date <= now {
        return Err(SettlementError::SurveyExpired(survey_id));
    }
    let answered = SurveyParticipant::find()
        .filter(ParticipantColumn::SurveyId.eq(survey_id))
        .filter(ParticipantColumn::UserId.eq(user_id))
        .count(uow.conn())
        .await?;
    if answered > 0 {
        return Err(SettlementError::AlreadyParticipated { survey_id, user_id });
    }

    let participant = ParticipantActiveModel {
        survey_id: ActiveValue::Set(survey_id),
        user_id: ActiveValue::Set(user_id),
        option_id: ActiveValue::Set(option_id),
        created_at: ActiveValue::Set(now),
        ..Default::default()
    }
    .insert(uow.conn())
    .await?;
    award_points(uow.conn(), user_id, PARTICIPATION_POINTS).await?;

    let kind = AttendanceKind::Participation;
    let streak = if is_marked_today(uow.conn(), user_id, kind, now).await? {
        None
    } else {
        Some(mark(uow, user_id, kind, now).await?)
    };
    Ok(ParticipationOutcome {
        participant,
        streak,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use rust_decimal::Decimal;
    use som_db_entity::db::user::Entity as User;

    async fn try_participate(
        db: &sea_orm::DatabaseConnection,
        survey_id: i32,
        user_id: i32,
    ) -> SettlementResult<ParticipationOutcome> {
        let mut uow = UnitOfWork::begin(db).await.unwrap();
        let result = participate(&mut uow, survey_id, user_id, 1, NOW).await;
        match result {
            Ok(_) => {
                uow.commit().await.unwrap();
            }
            Err(_) => uow.rollback().await.unwrap(),
        }
        result
    }

    #[tokio::test]
    async fn test_participation_marks_streak_once_a_day() {
        let db = setup_db().await;
        let owner = seed_user(&db, "owner", Decimal::ZERO).await;
        let first = seed_survey_with_status(&db, owner.user_id, SurveyStatus::Ongoing).await;
        let second = seed_survey_with_status(&db, owner.user_id, SurveyStatus::Ongoing).await;
        let user = seed_user(&db, "pia", Decimal::ZERO).await;

        let outcome = try_participate(&db, first.id, user.user_id).await.unwrap();
        assert_eq!(outcome.streak.unwrap().streak, 1);
        let outcome = try_participate(&db, second.id, user.user_id).await.unwrap();
        assert!(outcome.streak.is_none());

        let error = try_participate(&db, first.id, user.user_id).await.unwrap_err();
        assert_eq!(error.code(), "ALREADY_PARTICIPATED");

        let stored = User::find_by_id(user.user_id).one(&db).await.unwrap().unwrap();
        assert_eq!(stored.participation_streak, 1);
        assert_eq!(stored.respect_level_points, 2 * PARTICIPATION_POINTS);
    }

    #[tokio::test]
    async fn test_only_ongoing_surveys_accept_answers() {
        let db = setup_db().await;
        let owner = seed_user(&db, "owner", Decimal::ZERO).await;
        let enabled = seed_survey_with_status(&db, owner.user_id, SurveyStatus::Enabled).await;
        let error = try_participate(&db, enabled.id, owner.user_id).await.unwrap_err();
        assert_eq!(error.code(), "SURVEY_NOT_ONGOING");
        let error = try_participate(&db, 999, owner.user_id).await.unwrap_err();
        assert_eq!(error.code(), "SURVEY_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_second_answer_row_violates_unique_index() {
        let db = setup_db().await;
        let owner = seed_user(&db, "owner", Decimal::ZERO).await;
        let survey = seed_survey_with_status(&db, owner.user_id, SurveyStatus::Ongoing).await;
        let user = seed_user(&db, "quinn", Decimal::ZERO).await;
        try_participate(&db, survey.id, user.user_id).await.unwrap();

        let duplicate = ParticipantActiveModel {
            survey_id: ActiveValue::Set(survey.id),
            user_id: ActiveValue::Set(user.user_id),
            option_id: ActiveValue::Set(2),
            created_at: ActiveValue::Set(NOW),
            ..Default::default()
        }
        .insert(&db)
        .await;
        assert!(duplicate.is_err());
        let rows = SurveyParticipant::find()
            .filter(ParticipantColumn::SurveyId.eq(survey.id))
            .count(&db)
            .await
            .unwrap();
        assert_eq!(rows, 1);
    }
}
