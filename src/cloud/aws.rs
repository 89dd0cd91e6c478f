//! AWS SDK implementation of [`CloudApi`]

use super::{
    CloudApi, ConfigurationUpdate, FunctionState, FunctionSummary, LayerSummary, UpdateStatus,
};
use crate::config::AwsConfig;
use crate::error::CloudError;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_cloudwatchlogs::types::OrderBy;
use aws_sdk_lambda::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_lambda::types::{LastUpdateStatus, Runtime};
use chrono::{DateTime, Utc};
use tracing::debug;

/// Error codes the Lambda and CloudWatch Logs APIs use for credential or
/// permission problems.
const AUTH_ERROR_CODES: &[&str] = &[
    "AccessDeniedException",
    "AccessDenied",
    "UnrecognizedClientException",
    "InvalidSignatureException",
    "ExpiredTokenException",
    "InvalidClientTokenId",
    "UnauthorizedOperation",
];

pub struct AwsCloud {
    lambda: aws_sdk_lambda::Client,
    logs: aws_sdk_cloudwatchlogs::Client,
}

impl AwsCloud {
    /// Build clients from the SDK's default chain, narrowed by profile/region.
    pub async fn from_config(aws: &AwsConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(profile) = &aws.profile {
            loader = loader.profile_name(profile);
        }
        if let Some(region) = &aws.region {
            loader = loader.region(aws_config::Region::new(region.clone()));
        }
        let sdk_config = loader.load().await;

        debug!(
            region = ?sdk_config.region().map(|r| r.as_ref().to_string()),
            profile = ?aws.profile,
            "AWS clients configured"
        );

        Self {
            lambda: aws_sdk_lambda::Client::new(&sdk_config),
            logs: aws_sdk_cloudwatchlogs::Client::new(&sdk_config),
        }
    }
}

#[async_trait]
impl CloudApi for AwsCloud {
    async fn list_functions(&self) -> Result<Vec<FunctionSummary>, CloudError> {
        let mut functions = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let resp = self
                .lambda
                .list_functions()
                .set_marker(marker.take())
                .send()
                .await
                .map_err(|e| classify("ListFunctions", e))?;

            for function in resp.functions() {
                let Some(name) = function.function_name() else {
                    continue;
                };
                functions.push(FunctionSummary {
                    name: name.to_string(),
                    runtime: function.runtime().map(|r| r.as_str().to_string()),
                    layers: function
                        .layers()
                        .iter()
                        .filter_map(|l| l.arn().map(str::to_string))
                        .collect(),
                });
            }

            match resp.next_marker() {
                Some(next) if !next.is_empty() => marker = Some(next.to_string()),
                _ => break,
            }
        }

        debug!(count = functions.len(), "Listed functions");
        Ok(functions)
    }

    async fn get_function_configuration(&self, name: &str) -> Result<FunctionState, CloudError> {
        let resp = self
            .lambda
            .get_function_configuration()
            .function_name(name)
            .send()
            .await
            .map_err(|e| classify("GetFunctionConfiguration", e))?;

        let last_update_status = resp.last_update_status().map(|status| match status {
            LastUpdateStatus::Successful => UpdateStatus::Successful,
            LastUpdateStatus::Failed => UpdateStatus::Failed,
            _ => UpdateStatus::InProgress,
        });

        Ok(FunctionState {
            runtime: resp.runtime().map(|r| r.as_str().to_string()),
            layers: resp
                .layers()
                .iter()
                .filter_map(|l| l.arn().map(str::to_string))
                .collect(),
            last_update_status,
            last_update_status_reason: resp.last_update_status_reason().map(str::to_string),
        })
    }

    async fn update_function_configuration(
        &self,
        name: &str,
        update: &ConfigurationUpdate,
    ) -> Result<(), CloudError> {
        let mut request = self
            .lambda
            .update_function_configuration()
            .function_name(name);

        if let Some(runtime) = &update.runtime {
            request = request.runtime(Runtime::from(runtime.as_str()));
        }
        if let Some(layers) = &update.layers {
            request = request.set_layers(Some(layers.clone()));
        }

        request
            .send()
            .await
            .map_err(|e| classify("UpdateFunctionConfiguration", e))?;
        Ok(())
    }

    async fn last_invocation(&self, name: &str) -> Result<Option<DateTime<Utc>>, CloudError> {
        let log_group_name = format!("/aws/lambda/{}", name);

        let resp = self
            .logs
            .describe_log_streams()
            .log_group_name(&log_group_name)
            .order_by(OrderBy::LastEventTime)
            .descending(true)
            .limit(1)
            .send()
            .await;

        match resp {
            Ok(resp) => Ok(resp
                .log_streams()
                .first()
                .and_then(|stream| stream.last_event_timestamp())
                .and_then(DateTime::from_timestamp_millis)),
            Err(e)
                if e
                    .as_service_error()
                    .is_some_and(|se| se.is_resource_not_found_exception()) =>
            {
                Ok(None)
            }
            Err(e) => Err(classify("DescribeLogStreams", e)),
        }
    }

    async fn list_layers(&self) -> Result<Vec<LayerSummary>, CloudError> {
        let mut layers = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let resp = self
                .lambda
                .list_layers()
                .set_marker(marker.take())
                .send()
                .await
                .map_err(|e| classify("ListLayers", e))?;

            for layer in resp.layers() {
                let Some(name) = layer.layer_name() else {
                    continue;
                };
                let latest = layer.latest_matching_version();
                layers.push(LayerSummary {
                    name: name.to_string(),
                    latest_version_arn: latest
                        .and_then(|v| v.layer_version_arn())
                        .map(str::to_string),
                    description: latest
                        .and_then(|v| v.description())
                        .filter(|d| !d.is_empty())
                        .map(str::to_string),
                    compatible_runtimes: latest
                        .map(|v| {
                            v.compatible_runtimes()
                                .iter()
                                .map(|r| r.as_str().to_string())
                                .collect()
                        })
                        .unwrap_or_default(),
                });
            }

            match resp.next_marker() {
                Some(next) if !next.is_empty() => marker = Some(next.to_string()),
                _ => break,
            }
        }

        Ok(layers)
    }
}

/// Classify an SDK failure by its service error code. Requests that never
/// reached the service because no credentials could be resolved count as
/// authorization failures too.
fn classify<E, R>(operation: &str, err: SdkError<E, R>) -> CloudError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let code = err.code().map(str::to_string);
    let message = format!("{}: {}", operation, DisplayErrorContext(&err));

    match code.as_deref() {
        Some(code) if AUTH_ERROR_CODES.contains(&code) => CloudError::Unauthorized(message),
        Some("ResourceNotFoundException") => CloudError::NotFound(message),
        Some(_) => CloudError::Service(message),
        None if message.to_lowercase().contains("credentials") => {
            CloudError::Unauthorized(message)
        }
        None => CloudError::Service(message),
    }
}
