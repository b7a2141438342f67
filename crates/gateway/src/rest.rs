//! `reqwest`-backed implementation of the gateway contracts.

use std::env;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use tracing::debug;

use exam_core::model::{AnswerSubmission, ExamPaper, ExamResult};

use crate::remote::{
    AuthGateway, AuthSession, ExamGateway, GatewayError, NewProfile, OtpOutcome, UserProfile,
};
use crate::token::{TokenPair, TokenStore};
use crate::wire::{
    CreateProfileDto, QuestionListDto, RefreshDto, StatusDto, SubmitResponseDto, UserDto,
    VerifyOtpDto, answers_json, paper_from_dto, result_from_dto,
};

#[derive(Clone, Debug)]
pub struct GatewayConfig {
    pub base_url: String,
    pub dial_code: String,
}

impl GatewayConfig {
    /// Read configuration from the environment, falling back to the hosted
    /// demo API and an Indian dial code.
    #[must_use]
    pub fn from_env() -> Self {
        let base_url = env::var("EXAM_API_BASE_URL")
            .unwrap_or_else(|_| "https://nexlearn.noviindusdemosites.in".into());
        let dial_code = env::var("EXAM_API_DIAL_CODE").unwrap_or_else(|_| "+91".into());
        Self {
            base_url,
            dial_code,
        }
    }
}

/// REST adapter for the remote exam API.
///
/// Attaches the stored bearer token to every authorized request; a 401 maps
/// to [`GatewayError::Unauthorized`] and re-authentication happens
/// out-of-band.
#[derive(Clone)]
pub struct RestGateway {
    client: Client,
    config: GatewayConfig,
    tokens: Arc<dyn TokenStore>,
}

impl RestGateway {
    #[must_use]
    pub fn new(config: GatewayConfig, tokens: Arc<dyn TokenStore>) -> Self {
        Self {
            client: Client::new(),
            config,
            tokens,
        }
    }

    #[must_use]
    pub fn from_env(tokens: Arc<dyn TokenStore>) -> Self {
        Self::new(GatewayConfig::from_env(), tokens)
    }

    #[must_use]
    pub fn tokens(&self) -> Arc<dyn TokenStore> {
        Arc::clone(&self.tokens)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.config.base_url.trim_end_matches('/'))
    }

    fn prefixed_mobile(&self, mobile: &str) -> String {
        format!("{}{mobile}", self.config.dial_code)
    }

    fn bearer(&self, request: RequestBuilder) -> Result<RequestBuilder, GatewayError> {
        let pair = self.tokens.get()?.ok_or(GatewayError::MissingToken)?;
        Ok(request.bearer_auth(pair.access))
    }

    fn check_status(response: Response) -> Result<Response, GatewayError> {
        match response.status() {
            StatusCode::UNAUTHORIZED => Err(GatewayError::Unauthorized),
            status if !status.is_success() => Err(GatewayError::HttpStatus(status)),
            _ => Ok(response),
        }
    }

    fn store_tokens(
        &self,
        access: Option<String>,
        refresh: Option<String>,
        user: Option<UserDto>,
    ) -> Result<AuthSession, GatewayError> {
        let (Some(access), Some(refresh), Some(user)) = (access, refresh, user) else {
            return Err(GatewayError::Decode("incomplete auth response".into()));
        };

        let tokens = TokenPair { access, refresh };
        self.tokens.set(tokens.clone())?;
        Ok(AuthSession {
            user: UserProfile {
                id: user.id,
                name: user.name,
                email: user.email,
                mobile: user.mobile,
                qualification: user.qualification,
                profile_image: user.profile_image,
            },
            tokens,
        })
    }
}

#[async_trait]
impl ExamGateway for RestGateway {
    async fn fetch_exam(&self) -> Result<ExamPaper, GatewayError> {
        debug!("fetching question list");
        let request = self.bearer(self.client.get(self.endpoint("question/list")))?;
        let response = Self::check_status(request.send().await?)?;
        let dto: QuestionListDto = response.json().await?;
        paper_from_dto(dto)
    }

    async fn submit_answers(
        &self,
        answers: &[AnswerSubmission],
    ) -> Result<ExamResult, GatewayError> {
        debug!(entries = answers.len(), "submitting answers");
        let form = Form::new().text("answers", answers_json(answers)?);
        let request = self.bearer(self.client.post(self.endpoint("answers/submit")))?;
        let response = Self::check_status(request.multipart(form).send().await?)?;
        let dto: SubmitResponseDto = response.json().await?;
        result_from_dto(dto)
    }
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

#[async_trait]
impl AuthGateway for RestGateway {
    async fn send_otp(&self, mobile: &str) -> Result<(), GatewayError> {
        let form = Form::new().text("mobile", self.prefixed_mobile(mobile));
        let response = Self::check_status(
            self.client
                .post(self.endpoint("auth/send-otp"))
                .multipart(form)
                .send()
                .await?,
        )?;
        let dto: StatusDto = response.json().await?;
        dto.into_result()
    }

    async fn verify_otp(&self, mobile: &str, otp: &str) -> Result<OtpOutcome, GatewayError> {
        let form = Form::new()
            .text("mobile", self.prefixed_mobile(mobile))
            .text("otp", otp.to_owned());
        let response = Self::check_status(
            self.client
                .post(self.endpoint("auth/verify-otp"))
                .multipart(form)
                .send()
                .await?,
        )?;
        let dto: VerifyOtpDto = response.json().await?;

        if !dto.success {
            return Err(GatewayError::Rejected(
                dto.message.unwrap_or_else(|| "invalid otp".into()),
            ));
        }
        if !dto.login {
            return Ok(OtpOutcome::NeedsProfile);
        }
        self.store_tokens(dto.access_token, dto.refresh_token, dto.user)
            .map(OtpOutcome::Registered)
    }

    async fn create_profile(&self, profile: &NewProfile) -> Result<AuthSession, GatewayError> {
        let mut form = Form::new()
            .text("mobile", self.prefixed_mobile(&profile.mobile))
            .text("name", profile.name.clone())
            .text("email", profile.email.clone())
            .text("qualification", profile.qualification.clone());
        if let Some(image) = &profile.profile_image {
            form = form.part(
                "profile_image",
                Part::bytes(image.bytes.clone()).file_name(image.file_name.clone()),
            );
        }

        let response = Self::check_status(
            self.client
                .post(self.endpoint("auth/create-profile"))
                .multipart(form)
                .send()
                .await?,
        )?;
        let dto: CreateProfileDto = response.json().await?;

        if !dto.success {
            return Err(GatewayError::Rejected(
                dto.message.unwrap_or_else(|| "profile creation failed".into()),
            ));
        }
        self.store_tokens(dto.access_token, dto.refresh_token, dto.user)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<String, GatewayError> {
        let response = Self::check_status(
            self.client
                .post(self.endpoint("auth/refresh"))
                .json(&RefreshRequest { refresh_token })
                .send()
                .await?,
        )?;
        let dto: RefreshDto = response.json().await?;
        let access = dto
            .access_token
            .ok_or_else(|| GatewayError::Decode("missing access_token".into()))?;

        if let Some(mut pair) = self.tokens.get()? {
            pair.access = access.clone();
            self.tokens.set(pair)?;
        }
        Ok(access)
    }

    async fn logout(&self) -> Result<(), GatewayError> {
        let request = self.bearer(self.client.post(self.endpoint("auth/logout")))?;
        let response = Self::check_status(request.send().await?)?;
        let dto: StatusDto = response.json().await?;
        dto.into_result()?;
        self.tokens.clear()
    }
}
