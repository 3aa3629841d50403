use retry_json_http::{ClientOptions, HttpClient, JsonHttpClient};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Todo {
    id: u64,
    title: String,
    completed: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let uri = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "jsonplaceholder.typicode.com/todos/1".to_owned());

    let client = JsonHttpClient::new(ClientOptions::from_env()?);
    let todo: Todo = client.get(&uri).await?;

    println!("#{} {} (completed: {})", todo.id, todo.title, todo.completed);

    Ok(())
}
