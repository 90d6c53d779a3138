//! Content generation commands: `generate`, `post`, `ideas`, `test-provider`

use crate::cli::output::{format_connection_test, format_generation, format_ideas};
use crate::cli::{GenerateArgs, IdeasArgs, PostArgs, TestProviderArgs};
use crate::llm::{
    generate_content_ideas, generate_social_post, GenerationRequest, LlmClient, ProviderId,
    SocialPostContext,
};

pub fn build_request(args: &GenerateArgs) -> Result<GenerationRequest, Box<dyn std::error::Error>> {
    let mut request = GenerationRequest::new(args.prompt.clone());
    if let Some(ref provider) = args.provider {
        request = request.with_provider(provider.parse::<ProviderId>()?);
    }
    if let Some(max_tokens) = args.max_tokens {
        request = request.with_max_tokens(max_tokens);
    }
    if let Some(temperature) = args.temperature {
        request = request.with_temperature(temperature);
    }
    if let Some(ref platform) = args.platform {
        request = request.with_platform(platform.clone());
    }
    Ok(request)
}

/// Handle `poster generate`
pub async fn handle_generate(
    args: &GenerateArgs,
    client: &LlmClient,
) -> Result<String, Box<dyn std::error::Error>> {
    let request = build_request(args)?;
    let result = client.generate(&request).await?;
    Ok(format_generation(&result, args.json))
}

/// Handle `poster post`
pub async fn handle_post(
    args: &PostArgs,
    client: &LlmClient,
) -> Result<String, Box<dyn std::error::Error>> {
    let context = SocialPostContext {
        topic: args.topic.clone(),
        platform: args.platform,
        tone: args.tone.clone(),
        include_hashtags: args.hashtags,
    };
    Ok(generate_social_post(client, &context).await?)
}

/// Handle `poster ideas`
pub async fn handle_ideas(
    args: &IdeasArgs,
    client: &LlmClient,
) -> Result<String, Box<dyn std::error::Error>> {
    let ideas = generate_content_ideas(client, args.count).await?;
    Ok(format_ideas(&ideas, args.json))
}

/// Handle `poster test-provider`. A failed test is reported, not returned
/// as an error.
pub async fn handle_test_provider(args: &TestProviderArgs, client: &LlmClient) -> String {
    let test = client.test_connection(&args.provider).await;
    format_connection_test(&args.provider, &test, args.json)
}
