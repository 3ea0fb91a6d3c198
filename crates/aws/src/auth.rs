use aws_sdk_sns::config::Credentials;
use provision_notify_core::ClientCredentials;
use tracing::debug;

/// Provider name attached to the static credentials.
const CREDENTIALS_PROVIDER_NAME: &str = "provision-notify";

/// Build an AWS SDK configuration from resolved [`ClientCredentials`].
///
/// The access key, secret key, and optional session token are used as static
/// credentials. When no region was resolved the SDK's own region chain
/// (environment, profile) decides. An endpoint override is applied as-is.
///
/// # Examples
///
/// ```no_run
/// use provision_notify_aws::auth::build_sdk_config;
/// use provision_notify_core::ClientCredentials;
///
/// # async fn example() {
/// let credentials = ClientCredentials {
///     access_key: "AKIA...".into(),
///     secret_key: "...".into(),
///     token: None,
///     region: Some("eu-west-1".into()),
///     endpoint_url: Some("http://localhost:4566".into()),
/// };
/// let sdk_config = build_sdk_config(&credentials).await;
/// # }
/// ```
pub async fn build_sdk_config(credentials: &ClientCredentials) -> aws_config::SdkConfig {
    let static_credentials = Credentials::new(
        credentials.access_key.clone(),
        credentials.secret_key.clone(),
        credentials.token.clone(),
        None,
        CREDENTIALS_PROVIDER_NAME,
    );

    let mut loader = aws_config::from_env().credentials_provider(static_credentials);

    if let Some(region) = &credentials.region {
        loader = loader.region(aws_config::Region::new(region.clone()));
    }

    if let Some(endpoint) = &credentials.endpoint_url {
        debug!(endpoint = %endpoint, "using custom AWS endpoint");
        loader = loader.endpoint_url(endpoint);
    }

    loader.load().await
}
