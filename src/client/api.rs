//! A typed HTTP client for the expense tracker API.

use reqwest::{RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{
    Asset, AssetForm, AssetId, CategoryStats, LogInForm, LogInResponse, MeResponse,
    MessageResponse, MonthlyTotals, ProfileForm, PublicUser, RefreshResponse, RegisterForm,
    RegisterResponse, Transaction, TransactionForm, TransactionId, TransactionType,
    auth::RefreshForm,
    client::{
        error::{ClientError, Result},
        token_store::{TokenStore, Tokens},
    },
    endpoints::{self, format_endpoint},
    stats::{CategoryStatsQuery, MonthlyStatsQuery},
    transaction::TransactionQuery,
};

/// A built-in category as sent by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryInfo {
    /// The category ID, e.g. "food".
    pub id: String,
    /// The display name.
    pub name: String,
    /// An emoji to show next to the name.
    pub icon: String,
    /// A CSS hex colour.
    pub color: String,
    /// Whether the category is for income or expenses.
    #[serde(rename = "type")]
    pub kind: TransactionType,
}

/// The category catalog grouped by transaction type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryList {
    /// Categories for expenses.
    pub expense: Vec<CategoryInfo>,
    /// Categories for income.
    pub income: Vec<CategoryInfo>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// HTTP client for the expense tracker API.
///
/// Authenticated requests carry the stored access token. When the server
/// rejects it with 401 Unauthorized, the client exchanges the stored refresh
/// token for a new access token and retries the request once. If the refresh
/// fails, the stored tokens are cleared and [ClientError::SessionExpired] is
/// returned.
#[derive(Debug)]
pub struct ApiClient<S> {
    http: reqwest::Client,
    base_url: String,
    token_store: S,
}

impl<S: TokenStore> ApiClient<S> {
    /// Create a client for the server at `base_url`, e.g. "http://localhost:3000".
    pub fn new(base_url: impl Into<String>, token_store: S) -> Self {
        let base_url: String = base_url.into();

        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_owned(),
            token_store,
        }
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get the token store.
    pub fn token_store(&self) -> &S {
        &self.token_store
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Turn a response into `T`, or into [ClientError::Api] for non-success statuses.
    async fn parse<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();

        if status.is_success() {
            return response.json().await.map_err(ClientError::from);
        }

        let body = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ErrorBody>(&body) {
            Ok(error_body) => error_body.error,
            Err(_) => body,
        };

        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }

    /// Send the request made by `build` with the stored access token, refreshing
    /// the token and retrying once if the server answers 401.
    async fn send_authorized<F>(&self, build: F) -> Result<Response>
    where
        F: Fn() -> RequestBuilder,
    {
        let tokens = self.token_store.load()?.ok_or(ClientError::NotLoggedIn)?;

        let response = build().bearer_auth(&tokens.access_token).send().await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        tracing::debug!("Access token rejected, refreshing");

        let Some(refresh_token) = tokens.refresh_token else {
            self.token_store.clear()?;
            return Err(ClientError::SessionExpired);
        };

        let access_token = match self.refresh(&refresh_token).await {
            Ok(access_token) => access_token,
            Err(error) => {
                tracing::debug!("Could not refresh access token: {error}");
                self.token_store.clear()?;
                return Err(ClientError::SessionExpired);
            }
        };

        self.token_store.save(&Tokens {
            access_token: access_token.clone(),
            refresh_token: Some(refresh_token),
        })?;

        build()
            .bearer_auth(&access_token)
            .send()
            .await
            .map_err(ClientError::from)
    }

    /// Exchange `refresh_token` for a new access token.
    async fn refresh(&self, refresh_token: &str) -> Result<String> {
        let response = self
            .http
            .post(self.url(endpoints::REFRESH_TOKEN))
            .json(&RefreshForm {
                refresh_token: Some(refresh_token.to_owned()),
            })
            .send()
            .await?;

        Self::parse::<RefreshResponse>(response)
            .await
            .map(|response| response.access_token)
    }

    /// Register a new user.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        nickname: Option<&str>,
    ) -> Result<RegisterResponse> {
        let response = self
            .http
            .post(self.url(endpoints::REGISTER))
            .json(&RegisterForm {
                email: email.to_owned(),
                password: password.to_owned(),
                nickname: nickname.map(str::to_owned),
            })
            .send()
            .await?;

        Self::parse(response).await
    }

    /// Log in and store the returned tokens.
    pub async fn log_in(&self, email: &str, password: &str) -> Result<LogInResponse> {
        let response = self
            .http
            .post(self.url(endpoints::LOG_IN))
            .json(&LogInForm {
                email: email.to_owned(),
                password: password.to_owned(),
            })
            .send()
            .await?;

        let log_in: LogInResponse = Self::parse(response).await?;
        self.token_store.save(&Tokens {
            access_token: log_in.access_token.clone(),
            refresh_token: Some(log_in.refresh_token.clone()),
        })?;

        Ok(log_in)
    }

    /// Log out on the server and clear the stored tokens.
    ///
    /// The tokens are cleared even if the server could not be reached.
    pub async fn log_out(&self) -> Result<MessageResponse> {
        let response = self
            .send_authorized(|| self.http.post(self.url(endpoints::LOG_OUT)))
            .await;
        self.token_store.clear()?;

        Self::parse(response?).await
    }

    /// Get the signed-in user's profile, summary and assets.
    pub async fn me(&self) -> Result<MeResponse> {
        let response = self
            .send_authorized(|| self.http.get(self.url(endpoints::ME)))
            .await?;

        Self::parse(response).await
    }

    /// Change the signed-in user's nickname or avatar URL.
    pub async fn update_profile(&self, form: &ProfileForm) -> Result<PublicUser> {
        let response = self
            .send_authorized(|| self.http.put(self.url(endpoints::ME)).json(form))
            .await?;

        Self::parse(response).await
    }

    /// Get the built-in category catalog.
    pub async fn categories(&self) -> Result<CategoryList> {
        let response = self
            .http
            .get(self.url(endpoints::CATEGORIES))
            .send()
            .await?;

        Self::parse(response).await
    }

    /// List transactions, newest first.
    pub async fn list_transactions(&self, query: &TransactionQuery) -> Result<Vec<Transaction>> {
        let response = self
            .send_authorized(|| {
                self.http
                    .get(self.url(endpoints::TRANSACTIONS))
                    .query(query)
            })
            .await?;

        Self::parse(response).await
    }

    /// Record a new transaction.
    pub async fn create_transaction(&self, form: &TransactionForm) -> Result<Transaction> {
        let response = self
            .send_authorized(|| self.http.post(self.url(endpoints::TRANSACTIONS)).json(form))
            .await?;

        Self::parse(response).await
    }

    /// Get a transaction by its ID.
    pub async fn get_transaction(&self, transaction_id: TransactionId) -> Result<Transaction> {
        let path = format_endpoint(endpoints::TRANSACTION, transaction_id);
        let response = self
            .send_authorized(|| self.http.get(self.url(&path)))
            .await?;

        Self::parse(response).await
    }

    /// Replace a transaction.
    pub async fn update_transaction(
        &self,
        transaction_id: TransactionId,
        form: &TransactionForm,
    ) -> Result<Transaction> {
        let path = format_endpoint(endpoints::TRANSACTION, transaction_id);
        let response = self
            .send_authorized(|| self.http.put(self.url(&path)).json(form))
            .await?;

        Self::parse(response).await
    }

    /// Delete a transaction.
    pub async fn delete_transaction(
        &self,
        transaction_id: TransactionId,
    ) -> Result<MessageResponse> {
        let path = format_endpoint(endpoints::TRANSACTION, transaction_id);
        let response = self
            .send_authorized(|| self.http.delete(self.url(&path)))
            .await?;

        Self::parse(response).await
    }

    /// List the signed-in user's assets, oldest first.
    pub async fn list_assets(&self) -> Result<Vec<Asset>> {
        let response = self
            .send_authorized(|| self.http.get(self.url(endpoints::ASSETS)))
            .await?;

        Self::parse(response).await
    }

    /// Create an asset.
    pub async fn create_asset(&self, form: &AssetForm) -> Result<Asset> {
        let response = self
            .send_authorized(|| self.http.post(self.url(endpoints::ASSETS)).json(form))
            .await?;

        Self::parse(response).await
    }

    /// Replace an asset.
    pub async fn update_asset(&self, asset_id: AssetId, form: &AssetForm) -> Result<Asset> {
        let path = format_endpoint(endpoints::ASSET, asset_id);
        let response = self
            .send_authorized(|| self.http.put(self.url(&path)).json(form))
            .await?;

        Self::parse(response).await
    }

    /// Delete an asset. Transactions linked to it are kept and unlinked.
    pub async fn delete_asset(&self, asset_id: AssetId) -> Result<MessageResponse> {
        let path = format_endpoint(endpoints::ASSET, asset_id);
        let response = self
            .send_authorized(|| self.http.delete(self.url(&path)))
            .await?;

        Self::parse(response).await
    }

    /// Get totals by category.
    pub async fn category_stats(&self, query: &CategoryStatsQuery) -> Result<CategoryStats> {
        let response = self
            .send_authorized(|| {
                self.http
                    .get(self.url(endpoints::CATEGORY_STATS))
                    .query(query)
            })
            .await?;

        Self::parse(response).await
    }

    /// Get income and expense totals for recent months, oldest first.
    pub async fn monthly_stats(&self, months: Option<u32>) -> Result<Vec<MonthlyTotals>> {
        let query = MonthlyStatsQuery { months };
        let response = self
            .send_authorized(|| {
                self.http
                    .get(self.url(endpoints::MONTHLY_STATS))
                    .query(&query)
            })
            .await?;

        Self::parse(response).await
    }
}
