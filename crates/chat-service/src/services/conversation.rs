//! Conversation service
//!
//! Conversation lifecycle and the policy rules around it: duplicate
//! suppression on creation, who may add whom, leaving and archiving.

use std::collections::HashSet;

use chat_core::entities::{Conversation, ConversationKind, Participant, ParticipantRole};
use chat_core::events::{ParticipantJoinedEvent, ParticipantLeftEvent};
use chat_core::traits::{ConversationFilter, MessageQuery};
use chat_core::{ConversationEvent, ConversationId, DomainError, ParticipantKey, UserId};
use chrono::Utc;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

use crate::dto::{
    ConversationResponse, ConversationSummaryResponse, CreateConversationRequest,
    LastMessagePreview, MessageResponse, ParticipantResponse,
};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

/// Messages embedded in a conversation projection
const PROJECTION_HISTORY: i64 = 50;

/// Conversation service
pub struct ConversationService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> ConversationService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    // ========================================================================
    // Creation
    // ========================================================================

    /// Create a conversation, or return the live one it would duplicate.
    ///
    /// GROUP threads are unique per posting. DIRECT and POST_LINKED threads
    /// tied to a posting are unique per posting and exact participant set.
    /// Without a posting every request creates a new conversation.
    #[instrument(skip(self, request), fields(kind = %request.kind))]
    pub async fn create_conversation(
        &self,
        requester_id: UserId,
        request: CreateConversationRequest,
    ) -> ServiceResult<ConversationResponse> {
        request.validate()?;

        let others = normalize_participants(requester_id, &request.participant_ids)?;
        let kind = request.kind;
        let name = request.trimmed_name();
        let posting_ref = request
            .posting_ref
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string);

        if kind == ConversationKind::Direct && others.len() != 1 {
            return Err(DomainError::InvalidParticipants(
                "direct conversations need exactly one other participant".to_string(),
            )
            .into());
        }
        if kind == ConversationKind::PostLinked && posting_ref.is_none() {
            return Err(DomainError::MissingPostingRef.into());
        }

        let posting_title = match posting_ref.as_deref() {
            Some(posting_ref) => Some(
                self.ctx
                    .postings()
                    .posting_title(posting_ref)
                    .await?
                    .ok_or_else(|| DomainError::PostingNotFound(posting_ref.to_string()))?,
            ),
            None => None,
        };

        if kind == ConversationKind::Group && name.is_none() && posting_title.is_none() {
            return Err(DomainError::MissingGroupName.into());
        }

        let key = kind
            .is_pairwise()
            .then(|| ParticipantKey::from_users(others.iter().copied().chain([requester_id])));
        // Who must be active in a reused thread
        let parties: Vec<UserId> = if key.is_some() {
            std::iter::once(requester_id).chain(others.iter().copied()).collect()
        } else {
            vec![requester_id]
        };

        if let Some(posting_ref) = posting_ref.as_deref() {
            if let Some(existing) = self.find_live(posting_ref, kind, key.as_ref()).await? {
                debug!(conversation_id = %existing.id, "Reusing existing conversation");
                return self.reuse(existing, requester_id, &parties).await;
            }
        }

        let mut conversation = Conversation::new(kind, requester_id, name, posting_ref.clone());
        if let Some(key) = key.clone() {
            conversation = conversation.with_participant_key(key);
        }

        let mut participants = Vec::with_capacity(others.len() + 1);
        participants.push(Participant::new(conversation.id, requester_id, ParticipantRole::Admin));
        participants.extend(
            others
                .iter()
                .map(|&user| Participant::new(conversation.id, user, ParticipantRole::Member)),
        );
        conversation.participant_count = participants.len() as i32;

        match self
            .ctx
            .conversation_repo()
            .create(&conversation, &participants)
            .await
        {
            Ok(()) => {}
            Err(DomainError::DuplicateConversation) => {
                // Lost a creation race; the store picked a winner
                let posting_ref = posting_ref
                    .as_deref()
                    .ok_or_else(|| ServiceError::internal("duplicate without posting reference"))?;
                let winner = self
                    .find_live(posting_ref, kind, key.as_ref())
                    .await?
                    .ok_or_else(|| ServiceError::internal("duplicate conversation vanished"))?;
                info!(conversation_id = %winner.id, "Resolved concurrent creation to existing conversation");
                return self.reuse(winner, requester_id, &parties).await;
            }
            Err(e) => return Err(e.into()),
        }

        info!(
            conversation_id = %conversation.id,
            created_by = %requester_id,
            participants = participants.len(),
            "Conversation created"
        );

        self.project(conversation, participants, posting_title, Vec::new())
    }

    async fn find_live(
        &self,
        posting_ref: &str,
        kind: ConversationKind,
        key: Option<&ParticipantKey>,
    ) -> ServiceResult<Option<Conversation>> {
        let repo = self.ctx.conversation_repo();
        let found = match key {
            Some(key) => repo.find_active_pairwise(posting_ref, kind, key).await?,
            None => repo.find_active_group(posting_ref).await?,
        };
        Ok(found)
    }

    /// Hand an existing conversation back to a creator.
    ///
    /// Every party who left is rejoined, so a reused 1:1 thread always has
    /// both sides of its key active again.
    async fn reuse(
        &self,
        conversation: Conversation,
        requester_id: UserId,
        parties: &[UserId],
    ) -> ServiceResult<ConversationResponse> {
        let active = self.active_users(conversation.id).await?;

        for &user_id in parties.iter().filter(|u| !active.contains(u)) {
            self.join(&conversation, user_id, requester_id, ParticipantRole::Member)
                .await?;
        }

        self.load_projection(conversation.id).await
    }

    async fn active_users(&self, conversation_id: ConversationId) -> ServiceResult<HashSet<UserId>> {
        Ok(self
            .ctx
            .participant_repo()
            .list_active(conversation_id)
            .await?
            .into_iter()
            .map(|p| p.user_id)
            .collect())
    }

    // ========================================================================
    // Membership
    // ========================================================================

    /// Add `target_id` to a conversation.
    ///
    /// Self-join is allowed only while the conversation is group-like.
    /// Adding someone else requires an active ADMIN record. A target who is
    /// already active is returned unchanged.
    #[instrument(skip(self))]
    pub async fn add_participant(
        &self,
        requester_id: UserId,
        conversation_id: ConversationId,
        target_id: UserId,
    ) -> ServiceResult<ParticipantResponse> {
        let conversation = self
            .ctx
            .conversation_repo()
            .find_by_id(conversation_id)
            .await?
            .ok_or(DomainError::ConversationNotFound(conversation_id))?;

        let active = self
            .ctx
            .participant_repo()
            .list_active(conversation_id)
            .await?;
        let requester = active.iter().find(|p| p.user_id == requester_id);

        if requester_id == target_id {
            if !conversation.is_group_like(active.len()) {
                // Non-members learn nothing about a private conversation
                if requester.is_none() {
                    return Err(DomainError::ConversationNotFound(conversation_id).into());
                }
                return Err(DomainError::SelfJoinNotAllowed.into());
            }
        } else {
            match requester {
                Some(p) if p.is_admin() => {}
                Some(_) => {
                    return Err(DomainError::NotAuthorized(
                        "only admins can add participants".to_string(),
                    )
                    .into())
                }
                None => return Err(DomainError::ConversationNotFound(conversation_id).into()),
            }
            if conversation.kind == ConversationKind::Direct {
                return Err(DomainError::InvalidParticipants(
                    "direct conversations have exactly two participants".to_string(),
                )
                .into());
            }
        }

        if conversation.archived {
            return Err(DomainError::ConversationArchived.into());
        }

        if let Some(existing) = active.iter().find(|p| p.user_id == target_id) {
            debug!(user_id = %target_id, "Already an active participant");
            return Ok(ParticipantResponse::from(existing));
        }

        let participant = self
            .join(&conversation, target_id, requester_id, ParticipantRole::Member)
            .await?;
        Ok(ParticipantResponse::from(participant))
    }

    /// Insert or reactivate a participant record and announce it
    async fn join(
        &self,
        conversation: &Conversation,
        user_id: UserId,
        added_by: UserId,
        role: ParticipantRole,
    ) -> ServiceResult<Participant> {
        let participants = self.ctx.participant_repo();
        let now = Utc::now();

        let changed = match participants.find(conversation.id, user_id).await? {
            Some(existing) if existing.is_active() => false,
            Some(_) => participants.reactivate(conversation.id, user_id, now).await?,
            None => match participants
                .insert(&Participant::new(conversation.id, user_id, role))
                .await
            {
                Ok(()) => true,
                // Concurrent add of the same user
                Err(DomainError::AlreadyParticipant) => false,
                Err(e) => return Err(e.into()),
            },
        };

        let participant = participants
            .find(conversation.id, user_id)
            .await?
            .ok_or(DomainError::ParticipantNotFound)?;

        if changed {
            self.ctx
                .conversation_repo()
                .adjust_participant_count(conversation.id, 1)
                .await?;

            info!(
                conversation_id = %conversation.id,
                user_id = %user_id,
                added_by = %added_by,
                "Participant joined"
            );

            self.ctx
                .publish(ConversationEvent::ParticipantJoined(ParticipantJoinedEvent {
                    conversation_id: conversation.id,
                    user_id,
                    added_by,
                    role: participant.role,
                    timestamp: now,
                }))
                .await;
        }

        Ok(participant)
    }

    /// Leave a conversation. Leaving twice is a no-op.
    #[instrument(skip(self))]
    pub async fn leave_conversation(
        &self,
        user_id: UserId,
        conversation_id: ConversationId,
    ) -> ServiceResult<()> {
        if self
            .ctx
            .participant_repo()
            .find(conversation_id, user_id)
            .await?
            .is_none()
        {
            return Err(DomainError::ConversationNotFound(conversation_id).into());
        }

        let now = Utc::now();
        let left = self
            .ctx
            .participant_repo()
            .mark_left(conversation_id, user_id, now)
            .await?;
        if !left {
            return Ok(());
        }

        self.ctx
            .conversation_repo()
            .adjust_participant_count(conversation_id, -1)
            .await?;

        info!(conversation_id = %conversation_id, user_id = %user_id, "Participant left");

        self.ctx
            .publish(ConversationEvent::ParticipantLeft(ParticipantLeftEvent {
                conversation_id,
                user_id,
                timestamp: now,
            }))
            .await;

        Ok(())
    }

    /// Archive (close) a conversation.
    ///
    /// Either side of a 1:1 conversation may archive it; a group-like
    /// conversation needs an admin. Archived threads stop blocking creation
    /// of a new one for the same posting.
    #[instrument(skip(self))]
    pub async fn archive_conversation(
        &self,
        user_id: UserId,
        conversation_id: ConversationId,
    ) -> ServiceResult<()> {
        let (conversation, participant) = self.require_member(conversation_id, user_id).await?;
        if conversation.archived {
            return Ok(());
        }

        let active = self
            .ctx
            .participant_repo()
            .list_active(conversation_id)
            .await?
            .len();
        if conversation.is_group_like(active) && !participant.is_admin() {
            return Err(DomainError::NotAuthorized(
                "only admins can archive a group conversation".to_string(),
            )
            .into());
        }

        self.ctx
            .conversation_repo()
            .set_archived(conversation_id, true)
            .await?;

        info!(conversation_id = %conversation_id, archived_by = %user_id, "Conversation archived");
        Ok(())
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Live 1:1 conversation between exactly `user_a` and `user_b` about a posting
    #[instrument(skip(self))]
    pub async fn find_existing_direct_conversation(
        &self,
        posting_ref: &str,
        user_a: UserId,
        user_b: UserId,
    ) -> ServiceResult<Option<Conversation>> {
        if user_a == user_b {
            return Ok(None);
        }
        let key = ParticipantKey::from_users([user_a, user_b]);
        let wanted: HashSet<UserId> = [user_a, user_b].into_iter().collect();

        for kind in [ConversationKind::PostLinked, ConversationKind::Direct] {
            let Some(conversation) = self.find_live(posting_ref, kind, Some(&key)).await? else {
                continue;
            };
            if self.active_users(conversation.id).await? == wanted {
                return Ok(Some(conversation));
            }
        }

        Ok(None)
    }

    /// Projection of the caller's live 1:1 thread with `other_id` about a posting
    #[instrument(skip(self))]
    pub async fn get_direct_conversation(
        &self,
        requester_id: UserId,
        posting_ref: &str,
        other_id: UserId,
    ) -> ServiceResult<ConversationResponse> {
        let conversation = self
            .find_existing_direct_conversation(posting_ref.trim(), requester_id, other_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Direct conversation", posting_ref))?;
        self.load_projection(conversation.id).await
    }

    /// Conversations the user is active in, most recently active first
    #[instrument(skip(self, filter))]
    pub async fn get_conversations_for_user(
        &self,
        user_id: UserId,
        filter: ConversationFilter,
    ) -> ServiceResult<Vec<ConversationSummaryResponse>> {
        let conversations = self
            .ctx
            .conversation_repo()
            .find_by_user(user_id, &filter)
            .await?;

        let mut summaries = Vec::with_capacity(conversations.len());
        for conversation in conversations {
            let active = self
                .ctx
                .participant_repo()
                .list_active(conversation.id)
                .await?;
            let unread_count = active
                .iter()
                .find(|p| p.user_id == user_id)
                .map_or(0, |p| p.unread_count);
            let last_message = self.ctx.message_repo().latest(conversation.id).await?;
            let posting_title = self.posting_title(&conversation).await;

            summaries.push(ConversationSummaryResponse {
                id: conversation.id,
                kind: conversation.kind,
                display_name: conversation
                    .display_name(posting_title.as_deref())
                    .map(str::to_string),
                posting_ref: conversation.posting_ref.clone(),
                posting_title,
                archived: conversation.archived,
                is_group_like: conversation.is_group_like(active.len()),
                other_participants: active
                    .iter()
                    .map(|p| p.user_id)
                    .filter(|&id| id != user_id)
                    .collect(),
                unread_count,
                last_message: last_message.as_ref().map(LastMessagePreview::from),
                last_activity_at: conversation.last_activity_at,
            });
        }

        Ok(summaries)
    }

    /// Conversation with participants and recent history; members only
    #[instrument(skip(self))]
    pub async fn get_conversation(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
    ) -> ServiceResult<ConversationResponse> {
        self.require_member(conversation_id, user_id).await?;
        self.load_projection(conversation_id).await
    }

    /// The conversation and the caller's active record, or NotFound
    pub async fn require_member(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
    ) -> ServiceResult<(Conversation, Participant)> {
        let not_found = || ServiceError::from(DomainError::ConversationNotFound(conversation_id));

        let participant = self
            .ctx
            .participant_repo()
            .find_active(conversation_id, user_id)
            .await?
            .ok_or_else(not_found)?;
        let conversation = self
            .ctx
            .conversation_repo()
            .find_by_id(conversation_id)
            .await?
            .ok_or_else(not_found)?;

        Ok((conversation, participant))
    }

    async fn load_projection(
        &self,
        conversation_id: ConversationId,
    ) -> ServiceResult<ConversationResponse> {
        let conversation = self
            .ctx
            .conversation_repo()
            .find_by_id(conversation_id)
            .await?
            .ok_or(DomainError::ConversationNotFound(conversation_id))?;
        let participants = self
            .ctx
            .participant_repo()
            .list_active(conversation_id)
            .await?;
        let messages = self
            .ctx
            .message_repo()
            .find_by_conversation(
                conversation_id,
                MessageQuery {
                    before: None,
                    limit: PROJECTION_HISTORY,
                },
            )
            .await?;
        let posting_title = self.posting_title(&conversation).await;

        self.project(
            conversation,
            participants,
            posting_title,
            messages.iter().map(MessageResponse::from).collect(),
        )
    }

    fn project(
        &self,
        conversation: Conversation,
        participants: Vec<Participant>,
        posting_title: Option<String>,
        messages: Vec<MessageResponse>,
    ) -> ServiceResult<ConversationResponse> {
        Ok(ConversationResponse {
            id: conversation.id,
            kind: conversation.kind,
            display_name: conversation
                .display_name(posting_title.as_deref())
                .map(str::to_string),
            name: conversation.name.clone(),
            posting_ref: conversation.posting_ref.clone(),
            posting_title,
            created_by: conversation.created_by,
            archived: conversation.archived,
            is_group_like: conversation.is_group_like(participants.len()),
            participant_count: conversation.participant_count,
            participants: participants.iter().map(ParticipantResponse::from).collect(),
            messages,
            last_activity_at: conversation.last_activity_at,
            created_at: conversation.created_at,
        })
    }

    /// Title lookup for display; a failing directory only loses the title
    async fn posting_title(&self, conversation: &Conversation) -> Option<String> {
        let posting_ref = conversation.posting_ref.as_deref()?;
        match self.ctx.postings().posting_title(posting_ref).await {
            Ok(title) => title,
            Err(e) => {
                warn!(error = %e, posting_ref = %posting_ref, "Posting title lookup failed");
                None
            }
        }
    }
}

/// Other participants with the requester removed; rejects empty or repeated ids
fn normalize_participants(requester_id: UserId, ids: &[UserId]) -> ServiceResult<Vec<UserId>> {
    let mut seen = HashSet::with_capacity(ids.len());
    let mut others = Vec::with_capacity(ids.len());
    for &id in ids {
        if !seen.insert(id) {
            return Err(DomainError::InvalidParticipants(format!("duplicate participant {id}")).into());
        }
        if id != requester_id {
            others.push(id);
        }
    }
    if others.is_empty() {
        return Err(DomainError::InvalidParticipants(
            "at least one other participant is required".to_string(),
        )
        .into());
    }
    Ok(others)
}
