use indexmap::IndexMap;
use log::trace;
use serde::Serialize;

use crate::csv_tables::{CustomerTable, ProductTable};
use crate::json_handler::Transaction;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PurchaseKey {
    customer_id: String,
    product_id: String,
    product_category: String,
}

/// One line of the final report.
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct AggregateRow {
    pub customer_id: String,
    pub loyalty_score: String,
    pub product_id: String,
    pub product_category: String,
    pub purchase_count: u64,
}

/// The join-aggregate engine, responsible for resolving transactions against
/// the reference tables and maintaining one purchase counter per
/// (customer, product, category) triple. Counters iterate in first-occurrence
/// order.
#[derive(Debug, Default)]
pub struct PurchaseAggregator {
    counts: IndexMap<PurchaseKey, u64>,
}

impl PurchaseAggregator {
    /// Joins a batch of transactions against the reference tables. A customer
    /// missing from the customer table drops its whole transaction; a product
    /// missing from the product table drops that basket item only. May be
    /// called repeatedly to accumulate counts across batches.
    pub fn load_transactions(
        &mut self,
        customers: &CustomerTable,
        products: &ProductTable,
        transactions: impl IntoIterator<Item = Transaction>,
    ) {
        for transaction in transactions {
            if !customers.contains_key(&transaction.customer_id) {
                trace!("Customer {} is not in the customer table. Skipping transaction.", transaction.customer_id);
                continue;
            }
            for item in transaction.basket {
                let Some(product) = products.get(&item.product_id) else {
                    trace!("Product {} is not in the product table. Skipping basket item.", item.product_id);
                    continue;
                };
                let key = PurchaseKey {
                    customer_id: transaction.customer_id.clone(),
                    product_id: item.product_id,
                    product_category: product.product_category.clone(),
                };
                *self.counts.entry(key).or_insert(0) += 1;
            }
        }
    }

    /// Materializes one report row per counter, in first-occurrence order.
    /// Loyalty scores are taken from the customer table at emission time.
    pub fn rows<'a>(
        &'a self,
        customers: &'a CustomerTable,
    ) -> impl Iterator<Item = AggregateRow> + 'a {
        self.counts.iter().filter_map(|(key, &purchase_count)| {
            let customer = customers.get(&key.customer_id)?;
            Some(AggregateRow {
                customer_id: key.customer_id.clone(),
                loyalty_score: customer.loyalty_score.clone(),
                product_id: key.product_id.clone(),
                product_category: key.product_category.clone(),
                purchase_count,
            })
        })
    }
}

/// Joins one batch of transactions against the reference tables and returns
/// the aggregated report rows. Pure function of its inputs.
pub fn aggregate(
    customers: &CustomerTable,
    products: &ProductTable,
    transactions: impl IntoIterator<Item = Transaction>,
) -> Vec<AggregateRow> {
    let mut aggregator = PurchaseAggregator::default();
    aggregator.load_transactions(customers, products, transactions);
    aggregator.rows(customers).collect()
}
