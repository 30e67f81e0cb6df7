//! Contact form repository.

use fk_designers_core::{CustomizationRequestId, InquiryId};

use super::{Database, RepositoryError};
use crate::models::{NewContactInquiry, NewCustomizationRequest};

/// Repository for contact and customization submissions.
pub struct ContactRepository<'a> {
    db: &'a Database,
}

impl<'a> ContactRepository<'a> {
    /// Create a new contact repository.
    #[must_use]
    pub const fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Store a general inquiry.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert_inquiry(
        &self,
        inquiry: &NewContactInquiry,
    ) -> Result<InquiryId, RepositoryError> {
        self.db
            .run("insert_contact_inquiry", |pool| async move {
                sqlx::query_scalar::<_, InquiryId>(
                    r"
                    INSERT INTO contact_inquiries (name, email, phone, subject, message, ip_address)
                    VALUES ($1, $2, $3, $4, $5, $6)
                    RETURNING inquiry_id
                    ",
                )
                .bind(inquiry.name.as_str())
                .bind(inquiry.email.as_str())
                .bind(inquiry.phone.as_ref().map(|p| p.as_str()))
                .bind(inquiry.subject.as_str())
                .bind(inquiry.message.as_str())
                .bind(inquiry.ip_address.as_deref())
                .fetch_one(&pool)
                .await
            })
            .await
    }

    /// Store a customization request.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert_customization(
        &self,
        request: &NewCustomizationRequest,
    ) -> Result<CustomizationRequestId, RepositoryError> {
        self.db
            .run("insert_customization_request", |pool| async move {
                sqlx::query_scalar::<_, CustomizationRequestId>(
                    r"
                    INSERT INTO customization_requests (
                        name, email, phone, service_type, description,
                        budget, timeline, measurements, ip_address
                    ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                    RETURNING request_id
                    ",
                )
                .bind(request.name.as_str())
                .bind(request.email.as_str())
                .bind(request.phone.as_str())
                .bind(request.service_type.as_str())
                .bind(request.description.as_str())
                .bind(request.budget.as_deref())
                .bind(request.timeline.as_deref())
                .bind(request.measurements.as_deref())
                .bind(request.ip_address.as_deref())
                .fetch_one(&pool)
                .await
            })
            .await
    }
}
