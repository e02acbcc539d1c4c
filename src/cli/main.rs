use clap::{Parser, Subcommand};
use reqwest::Client;
use std::error::Error;

#[derive(Parser)]
#[command(name = "storefront-cli")]
#[command(about = "Storefront search CLI", long_about = None)]
struct Cli {
    #[arg(short, long, env = "STOREFRONT_ENDPOINT", default_value = "http://localhost:4000")]
    endpoint: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search products
    Search {
        /// Free-text query
        #[arg(value_name = "QUERY")]
        query: Option<String>,

        #[arg(short, long)]
        category: Option<String>,

        #[arg(long)]
        min_price: Option<f64>,

        #[arg(long)]
        max_price: Option<f64>,

        #[arg(short, long, default_value = "1")]
        page: u32,

        #[arg(short, long, default_value = "10")]
        limit: u32,
    },

    /// Rebuild the search index from the catalog
    Sync,

    /// Product catalog operations
    Product {
        #[command(subcommand)]
        command: ProductCommands,
    },

    /// Category operations
    Category {
        #[command(subcommand)]
        command: CategoryCommands,
    },

    /// Check server health
    Health,
}

#[derive(Subcommand)]
enum ProductCommands {
    /// List all products
    List,

    /// Get product details
    Get {
        #[arg(value_name = "PRODUCT_ID")]
        id: i64,
    },

    /// Delete a product
    Delete {
        #[arg(value_name = "PRODUCT_ID")]
        id: i64,
    },

    /// Add (positive) or remove (negative) units of one size
    Stock {
        #[arg(value_name = "PRODUCT_ID")]
        id: i64,

        #[arg(short, long)]
        size: u16,

        #[arg(short, long, allow_hyphen_values = true)]
        delta: i64,
    },
}

#[derive(Subcommand)]
enum CategoryCommands {
    /// List categories
    List,

    /// Create a category
    Create {
        #[arg(value_name = "NAME")]
        name: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let client = Client::new();

    let request = match cli.command {
        Commands::Search {
            query,
            category,
            min_price,
            max_price,
            page,
            limit,
        } => {
            let mut params: Vec<(&str, String)> =
                vec![("page", page.to_string()), ("limit", limit.to_string())];
            if let Some(q) = query {
                params.push(("q", q));
            }
            if let Some(category) = category {
                params.push(("categoria", category));
            }
            if let Some(min) = min_price {
                params.push(("minPrecio", min.to_string()));
            }
            if let Some(max) = max_price {
                params.push(("maxPrecio", max.to_string()));
            }

            client
                .get(format!("{}/search", cli.endpoint))
                .query(&params)
        }

        Commands::Sync => client.post(format!("{}/search/sync", cli.endpoint)),

        Commands::Product { command } => match command {
            ProductCommands::List => client.get(format!("{}/products", cli.endpoint)),
            ProductCommands::Get { id } => {
                client.get(format!("{}/products/{}", cli.endpoint, id))
            }
            ProductCommands::Delete { id } => {
                client.delete(format!("{}/products/{}", cli.endpoint, id))
            }
            ProductCommands::Stock { id, size, delta } => client
                .post(format!("{}/products/{}/stock", cli.endpoint, id))
                .json(&serde_json::json!({ "size": size, "delta": delta })),
        },

        Commands::Category { command } => match command {
            CategoryCommands::List => client.get(format!("{}/categories", cli.endpoint)),
            CategoryCommands::Create { name } => client
                .post(format!("{}/categories", cli.endpoint))
                .json(&serde_json::json!({ "name": name })),
        },

        Commands::Health => client.get(format!("{}/health", cli.endpoint)),
    };

    let response = request.send().await?;
    let status = response.status();
    let body: serde_json::Value = response.json().await?;
    println!("{}", serde_json::to_string_pretty(&body)?);

    if !status.is_success() {
        std::process::exit(1);
    }

    Ok(())
}
