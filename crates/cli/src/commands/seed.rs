//! Seed the database with sample script definitions.
//!
//! Inserted scripts are inactive so seeding never touches a live store.

use std::sync::Arc;

use secrecy::ExposeSecret;
use sqlx::PgPool;

use tagsmith_core::Placement;

use tagsmith_admin::db::{PgScriptStore, ScriptStore};
use tagsmith_admin::models::NewScript;

use super::CommandError;

/// Insert a few sample script definitions.
///
/// # Errors
///
/// Returns `CommandError` if the database URL is missing or an insert
/// fails.
pub async fn run() -> Result<(), CommandError> {
    let database_url = super::database_url()?;

    tracing::info!("Connecting to database...");
    let pool = PgPool::connect(database_url.expose_secret()).await?;
    let store: Arc<dyn ScriptStore> = Arc::new(PgScriptStore::new(pool));

    let samples = [
        NewScript {
            name: "Google Analytics Purchase Tracking".to_string(),
            placement: Placement::ThankYouPage,
            content: concat!(
                "<script>\n",
                "  gtag('event', 'purchase', {\n",
                "    transaction_id: '{{ order.order_number }}',\n",
                "    value: {{ order.total_price | money_without_currency }},\n",
                "    currency: '{{ order.currency }}'\n",
                "  });\n",
                "</script>"
            )
            .to_string(),
            active: false,
        },
        NewScript {
            name: "Facebook Pixel Conversion".to_string(),
            placement: Placement::ThankYouPage,
            content: concat!(
                "<script>\n",
                "  fbq('track', 'Purchase', {\n",
                "    value: {{ order.total_price | money_without_currency }},\n",
                "    currency: '{{ order.currency }}'\n",
                "  });\n",
                "</script>"
            )
            .to_string(),
            active: false,
        },
        NewScript {
            name: "Custom Affiliate Tracking".to_string(),
            placement: Placement::Checkout,
            content: "<script src=\"https://affiliates.example.com/track.js\" async></script>"
                .to_string(),
            active: false,
        },
    ];

    for sample in samples {
        let name = sample.name.clone();
        let script = store.insert(sample).await?;
        tracing::info!(id = %script.id, name = %name, "seeded script");
    }

    tracing::info!("Seeding complete");
    Ok(())
}
