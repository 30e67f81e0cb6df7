//! `/api/contact`: public contact and customization forms.

use axum::extract::State;
use serde::{Deserialize, Serialize};

use fk_designers_core::{CustomizationRequestId, InquiryId, ServiceType};

use crate::db::ContactRepository;
use crate::error::Result;
use crate::extract::Json;
use crate::middleware::ClientIp;
use crate::models::{NewContactInquiry, NewCustomizationRequest};
use crate::response::ApiResponse;
use crate::state::AppState;
use crate::validation::{Validator, escape_html, missing_after_validation};

#[derive(Debug, Default, Deserialize)]
pub struct ContactRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomizationRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub service_type: Option<String>,
    pub description: Option<String>,
    pub budget: Option<String>,
    pub timeline: Option<String>,
    pub measurements: Option<String>,
}

impl ContactRequest {
    fn validate(&self, ip: ClientIp) -> Result<NewContactInquiry> {
        let mut v = Validator::new();
        let name = v.text("name", self.name.as_deref(), 2, 100);
        let email = v.email("email", self.email.as_deref());
        let phone = v.optional_phone("phone", self.phone.as_deref());
        let subject = v.text("subject", self.subject.as_deref(), 2, 200);
        let message = v.text("message", self.message.as_deref(), 10, 1000);
        v.finish()?;

        let (Some(name), Some(email), Some(subject), Some(message)) =
            (name, email, subject, message)
        else {
            return Err(missing_after_validation());
        };

        Ok(NewContactInquiry {
            name: escape_html(&name),
            email,
            phone,
            subject: escape_html(&subject),
            message: escape_html(&message),
            ip_address: ip.to_db(),
        })
    }
}

impl CustomizationRequest {
    fn validate(&self, ip: ClientIp) -> Result<NewCustomizationRequest> {
        let mut v = Validator::new();
        let name = v.text("name", self.name.as_deref(), 2, 100);
        let email = v.email("email", self.email.as_deref());
        let phone = v.phone("phone", self.phone.as_deref());
        let service_type: Option<ServiceType> = v.one_of(
            "serviceType",
            self.service_type.as_deref(),
            &ServiceType::ALL.map(ServiceType::as_str),
        );
        let description = v.text("description", self.description.as_deref(), 10, 1000);
        let budget = v.optional_text("budget", self.budget.as_deref(), 100);
        let timeline = v.optional_text("timeline", self.timeline.as_deref(), 100);
        let measurements = v.optional_text("measurements", self.measurements.as_deref(), 1000);
        v.finish()?;

        let (Some(name), Some(email), Some(phone), Some(service_type), Some(description)) =
            (name, email, phone, service_type, description)
        else {
            return Err(missing_after_validation());
        };

        Ok(NewCustomizationRequest {
            name: escape_html(&name),
            email,
            phone,
            service_type,
            description: escape_html(&description),
            budget: budget.as_deref().map(escape_html),
            timeline: timeline.as_deref().map(escape_html),
            measurements: measurements.as_deref().map(escape_html),
            ip_address: ip.to_db(),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct InquiryCreated {
    pub inquiry_id: InquiryId,
}

#[derive(Debug, Serialize)]
pub struct CustomizationCreated {
    pub request_id: CustomizationRequestId,
}

/// `POST /api/contact/contact`
pub async fn contact(
    State(state): State<AppState>,
    ip: ClientIp,
    Json(body): Json<ContactRequest>,
) -> Result<ApiResponse<InquiryCreated>> {
    let inquiry = body.validate(ip)?;
    let inquiry_id = ContactRepository::new(state.db())
        .insert_inquiry(&inquiry)
        .await?;

    tracing::info!(inquiry_id = %inquiry_id, "Contact inquiry received");
    Ok(ApiResponse::created(
        "Contact inquiry submitted successfully",
        InquiryCreated { inquiry_id },
    ))
}

/// `POST /api/contact/customization`
pub async fn customization(
    State(state): State<AppState>,
    ip: ClientIp,
    Json(body): Json<CustomizationRequest>,
) -> Result<ApiResponse<CustomizationCreated>> {
    let request = body.validate(ip)?;
    let request_id = ContactRepository::new(state.db())
        .insert_customization(&request)
        .await?;

    tracing::info!(
        request_id = %request_id,
        service_type = %request.service_type,
        "Customization request received"
    );
    Ok(ApiResponse::created(
        "Customization request submitted successfully",
        CustomizationCreated { request_id },
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::error::AppError;

    use super::*;

    #[test]
    fn test_contact_is_trimmed_and_escaped() {
        let inquiry = ContactRequest {
            name: Some("  Ravi & Sons ".to_string()),
            email: Some("Ravi@Example.COM".to_string()),
            phone: Some(String::new()),
            subject: Some("Bulk order".to_string()),
            message: Some("<b>Need</b> 40 sherwanis".to_string()),
        }
        .validate(ClientIp(None))
        .unwrap();
        assert_eq!(inquiry.name, "Ravi &amp; Sons");
        assert_eq!(inquiry.email.as_str(), "ravi@example.com");
        assert!(inquiry.phone.is_none());
        assert_eq!(inquiry.message, "&lt;b&gt;Need&lt;&#x2F;b&gt; 40 sherwanis");
    }

    #[test]
    fn test_length_limit_applies_before_escaping() {
        let name = format!("D'Souza & Sons {}", "x".repeat(85));
        assert_eq!(name.chars().count(), 100);
        let inquiry = ContactRequest {
            name: Some(name),
            email: Some("orders@dsouza.in".to_string()),
            phone: None,
            subject: Some("Wholesale / retail".to_string()),
            message: Some("Looking for 200 school uniforms".to_string()),
        }
        .validate(ClientIp(None))
        .unwrap();
        assert!(inquiry.name.starts_with("D&#x27;Souza &amp; Sons"));
        assert_eq!(inquiry.name.chars().count(), 109);
        assert_eq!(inquiry.subject, "Wholesale &#x2F; retail");

        let too_long = ContactRequest {
            name: Some("x".repeat(101)),
            email: Some("orders@dsouza.in".to_string()),
            subject: Some("Wholesale".to_string()),
            message: Some("Looking for 200 school uniforms".to_string()),
            ..ContactRequest::default()
        };
        let AppError::Validation(errors) = too_long.validate(ClientIp(None)).unwrap_err() else {
            panic!("expected validation error");
        };
        assert_eq!(errors[0].field, "name");
    }

    #[test]
    fn test_customization_requires_known_service() {
        let body: CustomizationRequest = serde_json::from_value(serde_json::json!({
            "name": "Zoya",
            "email": "zoya@example.com",
            "phone": "+91 98200 12345",
            "serviceType": "dry-cleaning",
            "description": "Lehenga alterations before the wedding"
        }))
        .unwrap();
        let AppError::Validation(errors) = body.validate(ClientIp(None)).unwrap_err() else {
            panic!("expected validation error");
        };
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "serviceType");
    }

    #[test]
    fn test_customization_accepts_camel_case_body() {
        let body: CustomizationRequest = serde_json::from_value(serde_json::json!({
            "name": "Zoya",
            "email": "zoya@example.com",
            "phone": "+91 98200 12345",
            "serviceType": "alterations",
            "description": "Lehenga alterations before the wedding",
            "budget": "15000"
        }))
        .unwrap();
        let request = body.validate(ClientIp(None)).unwrap();
        assert_eq!(request.service_type, ServiceType::Alterations);
        assert_eq!(request.budget.as_deref(), Some("15000"));
    }
}
