use crate::error::{ApiError, Result};
use sea_orm::{
    entity::*, query::*, sea_query::OnConflict, DatabaseConnection, DbErr, TransactionTrait,
};
use tracing::{info, instrument};
use uuid::Uuid;

/// Poll with options and per-option vote counts, as returned to callers.
#[derive(Debug, Clone)]
pub struct PollWithVotes {
    pub poll: entity::polls::Model,
    pub options: Vec<OptionWithVotes>,
    pub total_votes: u64,
}

#[derive(Debug, Clone)]
pub struct OptionWithVotes {
    pub option: entity::poll_options::Model,
    pub votes: u64,
}

pub struct PollService {
    db: DatabaseConnection,
}

impl PollService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a poll with its options in one transaction.
    #[instrument(skip(self, options))]
    pub async fn create_poll(
        &self,
        user_id: &str,
        title: &str,
        description: Option<&str>,
        options: Vec<(String, Option<String>)>,
    ) -> Result<PollWithVotes> {
        if options.len() < 2 || options.len() > 4 {
            return Err(ApiError::BadRequest(
                "A poll requires between 2 and 4 options".to_string(),
            ));
        }

        let txn = self.db.begin().await?;
        let now = time::OffsetDateTime::now_utc();
        let poll_id = Uuid::new_v4();

        let poll = entity::polls::ActiveModel {
            id: Set(poll_id),
            user_id: Set(user_id.to_string()),
            title: Set(title.to_string()),
            description: Set(description.map(|s| s.to_string())),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let mut created_options = Vec::with_capacity(options.len());
        for (text, image_url) in options {
            let option = entity::poll_options::ActiveModel {
                id: Set(Uuid::new_v4()),
                poll_id: Set(poll_id),
                text: Set(text),
                image_url: Set(image_url),
            }
            .insert(&txn)
            .await?;
            created_options.push(OptionWithVotes { option, votes: 0 });
        }

        txn.commit().await?;

        info!("Created poll {} for user {}", poll_id, user_id);

        Ok(PollWithVotes {
            poll,
            options: created_options,
            total_votes: 0,
        })
    }

    /// List polls with vote counts, newest first. `user_id` filters to one
    /// creator's polls.
    #[instrument(skip(self))]
    pub async fn list_polls(
        &self,
        user_id: Option<&str>,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<PollWithVotes>> {
        let mut query = entity::polls::Entity::find()
            .order_by_desc(entity::polls::Column::CreatedAt)
            .limit(limit)
            .offset(offset);

        if let Some(user_id) = user_id {
            query = query.filter(entity::polls::Column::UserId.eq(user_id));
        }

        let polls = query.all(&self.db).await?;

        let mut result = Vec::with_capacity(polls.len());
        for poll in polls {
            result.push(self.attach_votes(poll).await?);
        }

        Ok(result)
    }

    /// Fetch a single poll with vote counts.
    #[instrument(skip(self))]
    pub async fn get_poll(&self, poll_id: Uuid) -> Result<PollWithVotes> {
        let poll = entity::polls::Entity::find_by_id(poll_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Poll {} not found", poll_id)))?;

        self.attach_votes(poll).await
    }

    /// Record a vote. One vote per user per poll, enforced by the unique
    /// index; a second vote surfaces as Conflict rather than a 500.
    #[instrument(skip(self))]
    pub async fn vote(
        &self,
        poll_id: Uuid,
        option_id: Uuid,
        user_id: &str,
    ) -> Result<entity::votes::Model> {
        let option = entity::poll_options::Entity::find_by_id(option_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Option {} not found", option_id)))?;

        if option.poll_id != poll_id {
            return Err(ApiError::BadRequest(
                "Option does not belong to this poll".to_string(),
            ));
        }

        let vote_id = Uuid::new_v4();
        let new_vote = entity::votes::ActiveModel {
            id: Set(vote_id),
            poll_id: Set(poll_id),
            option_id: Set(option_id),
            user_id: Set(user_id.to_string()),
            created_at: Set(time::OffsetDateTime::now_utc()),
        };

        let insert_result = entity::votes::Entity::insert(new_vote)
            .on_conflict(
                OnConflict::columns([
                    entity::votes::Column::PollId,
                    entity::votes::Column::UserId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec(&self.db)
            .await;

        match insert_result {
            Ok(_) => {}
            Err(DbErr::RecordNotInserted) => {
                return Err(ApiError::Conflict(
                    "User has already voted on this poll".to_string(),
                ));
            }
            Err(e) => return Err(e.into()),
        }

        let vote = entity::votes::Entity::find_by_id(vote_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| {
                ApiError::Conflict("User has already voted on this poll".to_string())
            })?;

        info!("Recorded vote on poll {} by user {}", poll_id, user_id);

        Ok(vote)
    }

    async fn attach_votes(&self, poll: entity::polls::Model) -> Result<PollWithVotes> {
        let options = entity::poll_options::Entity::find()
            .filter(entity::poll_options::Column::PollId.eq(poll.id))
            .all(&self.db)
            .await?;

        let mut total_votes = 0;
        let mut options_with_votes = Vec::with_capacity(options.len());
        for option in options {
            let votes = entity::votes::Entity::find()
                .filter(entity::votes::Column::OptionId.eq(option.id))
                .count(&self.db)
                .await?;
            total_votes += votes;
            options_with_votes.push(OptionWithVotes { option, votes });
        }

        Ok(PollWithVotes {
            poll,
            options: options_with_votes,
            total_votes,
        })
    }
}
