use anyhow::{Context, Result};
use serde_json::{json, Value};

fn endpoint(server: &str, path: &str) -> String {
    format!("{}{}", server.trim_end_matches('/'), path)
}

/// Ask a running server to generate a recipe and print its answer.
///
/// Returns an error when the server answers with a non-success status, after
/// printing the body so `rawResponse` stays visible.
pub async fn request_recipe(server: &str, token: &str, ingredients: &str) -> Result<()> {
    let url = endpoint(server, "/api/recipes/generate");

    let response = reqwest::Client::new()
        .post(&url)
        .bearer_auth(token)
        .json(&json!({ "ingredients": ingredients }))
        .send()
        .await
        .with_context(|| format!("Failed to reach {}", url))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .context("Failed to read response body")?;

    match serde_json::from_str::<Value>(&body) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", body),
    }

    if !status.is_success() {
        anyhow::bail!("Server returned {}", status);
    }

    Ok(())
}

pub async fn ping(server: &str) -> Result<()> {
    let url = endpoint(server, "/api/test/unauthed-ping");

    let response: Value = reqwest::get(&url)
        .await
        .with_context(|| format!("Failed to reach {}", url))?
        .error_for_status()?
        .json()
        .await
        .context("Ping response was not JSON")?;

    println!("{}", response["message"].as_str().unwrap_or_default());

    Ok(())
}
