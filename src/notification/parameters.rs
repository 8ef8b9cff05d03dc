//! Substitution parameters per notification kind.
//!
//! The key set of every template is fixed here; the provider templates use
//! the same names wrapped in `-` delimiters.

use crate::message::TemplateParameter;

/// Converts a typed parameter set into substitution parameters
pub trait TemplateParameters {
    fn into_parameters(self) -> Vec<TemplateParameter>;
}

/// ResetPassword: `email`, `link`
#[derive(Debug, Clone)]
pub struct ResetPasswordParameters {
    pub email: String,
    pub link: String,
}

impl TemplateParameters for ResetPasswordParameters {
    fn into_parameters(self) -> Vec<TemplateParameter> {
        vec![
            TemplateParameter::new("email", self.email),
            TemplateParameter::new("link", self.link),
        ]
    }
}

/// ActivateAccount: `email`, `username`
#[derive(Debug, Clone)]
pub struct ActivateAccountParameters {
    pub email: String,
    pub username: String,
}

impl TemplateParameters for ActivateAccountParameters {
    fn into_parameters(self) -> Vec<TemplateParameter> {
        vec![
            TemplateParameter::new("email", self.email),
            TemplateParameter::new("username", self.username),
        ]
    }
}

/// RemarkCreated and PhotosAdded: `remarkId`, `category`, `address`,
/// `username`, `date`, `url`
#[derive(Debug, Clone)]
pub struct RemarkParameters {
    pub remark_id: String,
    pub category: String,
    pub address: String,
    pub username: String,
    /// Already formatted for the template culture
    pub date: String,
    pub url: String,
}

impl TemplateParameters for RemarkParameters {
    fn into_parameters(self) -> Vec<TemplateParameter> {
        vec![
            TemplateParameter::new("remarkId", self.remark_id),
            TemplateParameter::new("category", self.category),
            TemplateParameter::new("address", self.address),
            TemplateParameter::new("username", self.username),
            TemplateParameter::new("date", self.date),
            TemplateParameter::new("url", self.url),
        ]
    }
}

/// RemarkStateChanged: remark keys and `state`
#[derive(Debug, Clone)]
pub struct RemarkStateChangedParameters {
    pub remark: RemarkParameters,
    pub state: String,
}

impl TemplateParameters for RemarkStateChangedParameters {
    fn into_parameters(self) -> Vec<TemplateParameter> {
        let mut params = self.remark.into_parameters();
        params.push(TemplateParameter::new("state", self.state));
        params
    }
}

/// CommentAdded: remark keys and `comment`
#[derive(Debug, Clone)]
pub struct CommentAddedParameters {
    pub remark: RemarkParameters,
    pub comment: String,
}

impl TemplateParameters for CommentAddedParameters {
    fn into_parameters(self) -> Vec<TemplateParameter> {
        let mut params = self.remark.into_parameters();
        params.push(TemplateParameter::new("comment", self.comment));
        params
    }
}
