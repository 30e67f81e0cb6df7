//! Contact form submissions.

use fk_designers_core::{Email, Phone, ServiceType};

/// A validated, HTML-escaped `POST /api/contact/contact` body.
#[derive(Debug, Clone)]
pub struct NewContactInquiry {
    pub name: String,
    pub email: Email,
    pub phone: Option<Phone>,
    pub subject: String,
    pub message: String,
    pub ip_address: Option<String>,
}

/// A validated, HTML-escaped `POST /api/contact/customization` body.
#[derive(Debug, Clone)]
pub struct NewCustomizationRequest {
    pub name: String,
    pub email: Email,
    pub phone: Phone,
    pub service_type: ServiceType,
    pub description: String,
    pub budget: Option<String>,
    pub timeline: Option<String>,
    pub measurements: Option<String>,
    pub ip_address: Option<String>,
}
