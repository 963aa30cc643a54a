use lambda_http::{run, service_fn, tracing, Error};
mod config;
mod http_handler;
mod store;
use config::Config;
use http_handler::function_handler;
use store::DynamoDirectoryStore;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing::init_default_subscriber();

    let config = Config::from_env()?;
    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let client = aws_sdk_dynamodb::Client::new(&aws_config);
    tracing::info!(table = %config.table_name, "directory function ready");

    let store = DynamoDirectoryStore::new(client, config.table_name);

    run(service_fn(|event| function_handler(&store, event))).await
}
