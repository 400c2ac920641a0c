//! Live xAI API tests, run with `--features api`.

mod test_utils;

use mangaweave_interface::MangaweaveDriver;
use mangaweave_models::XaiClient;
use test_utils::text_request;

#[tokio::test]
#[cfg_attr(not(feature = "api"), ignore)]
async fn test_xai_basic_generation() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let client = XaiClient::from_env("XAI_API_KEY", "https://api.x.ai/v1", "grok-4-fast-reasoning")?
        .with_requests_per_minute(Some(30));

    let response = client.generate(&text_request("Reply with the word ok.")).await?;

    assert!(!response.text().is_empty(), "Should receive non-empty response");
    Ok(())
}
