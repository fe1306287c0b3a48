//! Authenticated session with a cached account snapshot.
//!
//! A [`Session`] is opened by logging in and resolving the account id, and
//! is closed by consuming it. Dropping an open session also logs out, so
//! logout is attempted exactly once on every exit path, unwinding included.
//! Prefer [`Session::scoped`], which closes the session whatever the closure
//! returns.

use std::collections::BTreeMap;

use degiro::{
    CashFund, Interval, Portfolio, PortfolioSummary, PriceSeries, Product, ProductSource,
    extract_cash_funds, extract_portfolio, summarize,
};
use log::{debug, info};
use serde_json::Value;

use crate::client::{DegiroClient, SessionContext};
use crate::credentials::Credentials;
use crate::error::DegiroError;
use crate::transport::Transport;

/// Default server-side result count for product search.
pub const DEFAULT_SEARCH_LIMIT: u32 = 1;

/// One logged-in connection to the broker.
pub struct Session<T: Transport> {
    client: DegiroClient<T>,
    context: SessionContext,
    snapshot: Option<Value>,
    logged_out: bool,
}

impl<T: Transport> Session<T> {
    /// Log in and resolve the account id.
    pub fn open(client: DegiroClient<T>, credentials: &Credentials) -> Result<Self, DegiroError> {
        let token = client.login(credentials)?;
        let account_id = client.account_id(&token)?;
        Ok(Self {
            client,
            context: SessionContext {
                token,
                account_id,
                client_id: None,
            },
            snapshot: None,
            logged_out: false,
        })
    }

    /// Open a session, run `f`, then log out whatever `f` returned.
    pub fn scoped<R, E, F>(
        client: DegiroClient<T>,
        credentials: &Credentials,
        f: F,
    ) -> Result<R, E>
    where
        F: FnOnce(&mut Session<T>) -> Result<R, E>,
        E: From<DegiroError>,
    {
        let mut session = Session::open(client, credentials)?;
        let result = f(&mut session);
        session.close();
        result
    }

    /// Log out. Failures are logged and swallowed.
    pub fn close(mut self) {
        self.logout_once();
    }

    fn logout_once(&mut self) {
        if !self.logged_out {
            self.logged_out = true;
            let _ = self.client.logout(&self.context);
        }
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn account_id(&self) -> i64 {
        self.context.account_id
    }

    pub fn client(&self) -> &DegiroClient<T> {
        &self.client
    }

    /// Client id, fetched on first use.
    pub fn client_id(&mut self) -> Result<i64, DegiroError> {
        if let Some(id) = self.context.client_id {
            return Ok(id);
        }
        let id = self.client.client_id(&self.context.token)?;
        debug!("Client id resolved");
        self.context.client_id = Some(id);
        Ok(id)
    }

    /// Combined snapshot, fetched once and reused until [`refresh`](Self::refresh).
    pub fn snapshot(&mut self) -> Result<&Value, DegiroError> {
        cached_snapshot(&mut self.snapshot, &self.client, &self.context)
    }

    /// Refetch the snapshot unconditionally.
    pub fn refresh(&mut self) -> Result<&Value, DegiroError> {
        self.snapshot = None;
        self.snapshot()
    }

    /// Raw product-info payload for `ids`.
    pub fn product_info(&self, ids: &[String]) -> Result<Value, DegiroError> {
        self.client.product_info(&self.context, ids)
    }

    /// Every product in a product-info lookup.
    pub fn products(&self, ids: &[String]) -> Result<Vec<Product>, DegiroError> {
        let payload = self.product_info(ids)?;
        Ok(ProductSource::from_value(payload)?.into_products())
    }

    /// Raw search payload.
    pub fn search(&self, text: &str, limit: u32) -> Result<Value, DegiroError> {
        self.client.search(&self.context, text, limit)
    }

    /// Best search match for `text`.
    pub fn search_product(&self, text: &str) -> Result<Product, DegiroError> {
        Ok(Product::from_value(self.search(text, DEFAULT_SEARCH_LIMIT)?)?)
    }

    /// Price history of `product` over `interval`.
    pub fn historic_price(
        &mut self,
        product: &Product,
        interval: Interval,
    ) -> Result<PriceSeries, DegiroError> {
        let streaming_id = product.streaming_id().ok_or(DegiroError::Lookup {
            operation: "get historic price",
            field: "vwdId",
        })?;
        let client_id = self.client_id()?;
        let raw = self.client.historic_price(client_id, streaming_id, interval)?;
        let series = PriceSeries::from_response(&raw)?;
        info!(
            "Fetched {} price points for {} ({interval})",
            series.points.len(),
            product.name()
        );
        Ok(series)
    }

    /// Non-zero cash balances by currency, from the cached snapshot.
    pub fn cash_funds(&mut self) -> Result<BTreeMap<String, CashFund>, DegiroError> {
        Ok(extract_cash_funds(self.snapshot()?)?)
    }

    /// Held positions merged with product info, from the cached snapshot.
    pub fn portfolio(&mut self) -> Result<Portfolio, DegiroError> {
        let snapshot = cached_snapshot(&mut self.snapshot, &self.client, &self.context)?;
        let (client, context) = (&self.client, &self.context);
        extract_portfolio(snapshot, |ids: &[String]| client.product_info(context, ids))
    }

    /// Portfolio summary table with cash in `base_currency` added to the total.
    pub fn portfolio_summary(
        &mut self,
        base_currency: &str,
    ) -> Result<(PortfolioSummary, BTreeMap<String, CashFund>), DegiroError> {
        let portfolio = self.portfolio()?;
        let cash = self.cash_funds()?;
        Ok((summarize(&portfolio, &cash, base_currency), cash))
    }
}

impl<T: Transport> Drop for Session<T> {
    fn drop(&mut self) {
        self.logout_once();
    }
}

/// Fill `slot` from the update endpoint unless it already holds a snapshot.
fn cached_snapshot<'a, T: Transport>(
    slot: &'a mut Option<Value>,
    client: &DegiroClient<T>,
    context: &SessionContext,
) -> Result<&'a Value, DegiroError> {
    let data = match slot.take() {
        Some(data) => data,
        None => client.update(context)?,
    };
    Ok(slot.insert(data))
}
