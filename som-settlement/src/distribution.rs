use crate::error::SettlementResult;
use crate::ledger;
use crate::notification::{save_notifications, SURVEY_RESULT, SURVEY_REWARD};
use crate::reward;
use crate::unit_of_work::UnitOfWork;
use rand::seq::SliceRandom;
use rand::Rng;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use som_db_entity::db::reward::Model as RewardModel;
use som_db_entity::db::sea_orm_active_enums::RewardType;
use som_db_entity::db::survey::{Column as SurveyColumn, Entity as Survey, Model as SurveyModel};
use som_db_entity::db::survey_participant::{
    Column as ParticipantColumn, Entity as SurveyParticipant,
};
use tracing::info;

#[derive(Clone, Debug, PartialEq)]
pub struct DistributionReport {
    pub survey_id: i32,
    pub participants: usize,
    pub rewards: Vec<RewardModel>,
    /// Rewards of this survey were paid by an earlier run.
    pub already_distributed: bool,
}

/// Picks `count` distinct users uniformly at random, or everyone when there
/// are fewer participants than rewards.
pub fn pick_rewardees_with<R: Rng + ?Sized>(
    rng: &mut R,
    mut participants: Vec<i32>,
    count: usize,
) -> Vec<i32> {
    participants.sort_unstable();
    participants.dedup();
    if participants.len() <= count {
        return participants;
    }
    let (chosen, _) = participants.partial_shuffle(rng, count);
    chosen.to_vec()
}

pub fn pick_rewardees(participants: Vec<i32>, count: usize) -> Vec<i32> {
    pick_rewardees_with(&mut rand::thread_rng(), participants, count)
}

/// Pays the survey reward to a random subset of its participants.
///
/// The survey is claimed through `rewards_distributed` first, so a retried end
/// job that finds it already claimed pays nothing.
pub async fn distribute_survey_rewards(
    uow: &mut UnitOfWork,
    survey: &SurveyModel,
    now: i64,
) -> SettlementResult<DistributionReport> {
    let claimed = Survey::update_many()
        .col_expr(SurveyColumn::RewardsDistributed, Expr::value(true))
        .filter(SurveyColumn::Id.eq(survey.id))
        .filter(SurveyColumn::RewardsDistributed.eq(false))
        .exec(uow.conn())
        .await?;
    if claimed.rows_affected == 0 {
        info!("Rewards of survey {} already distributed", survey.id);
        return Ok(DistributionReport {
            survey_id: survey.id,
            participants: 0,
            rewards: Vec::new(),
            already_distributed: true,
        });
    }

    let participants: Vec<i32> = SurveyParticipant::find()
        .filter(ParticipantColumn::SurveyId.eq(survey.id))
        .order_by_asc(ParticipantColumn::Id)
        .all(uow.conn())
        .await?
        .into_iter()
        .map(|participant| participant.user_id)
        .collect();
    let participant_count = participants.len();
    let rewardees = pick_rewardees(participants, survey.rewardees_count.max(0) as usize);

    let mut rewards = Vec::with_capacity(rewardees.len());
    for user_id in rewardees.iter() {
        let wallet = ledger::find_wallet_by_user(uow.conn(), *user_id).await?;
        rewards.push(
            reward::grant(
                uow.conn(),
                &wallet,
                survey.reward_amount,
                RewardType::SurveyParticipation,
                Some(survey.id),
                now,
            )
            .await?,
        );
    }

    let rewarded = save_notifications(
        uow.conn(),
        &rewardees,
        SURVEY_REWARD,
        &survey.title,
        &format!("You received {} SoM for taking part", survey.reward_amount),
        now,
    )
    .await?;
    uow.queue(rewarded);
    let result = save_notifications(
        uow.conn(),
        &[survey.user_id],
        SURVEY_RESULT,
        &survey.title,
        &format!(
            "Rewards were sent to {} of {} participants",
            rewardees.len(),
            participant_count
        ),
        now,
    )
    .await?;
    uow.queue(result);

    info!(
        "Survey {} rewarded {} of {} participants",
        survey.id,
        rewardees.len(),
        participant_count
    );
    Ok(DistributionReport {
        survey_id: survey.id,
        participants: participant_count,
        rewards,
        already_distributed: false,
    })
}
