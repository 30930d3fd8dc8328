//! In-memory store and scripted LLM provider used by unit tests across the crate.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{Utc, NaiveDate};
use rust_decimal::Decimal;
use uuid::Uuid;

use clara_types::catalog::{NewProduct, NewUser, Product, ProductQuery, User};
use clara_types::chat::{Channel, ChatMessage, ChatRole, ChatSession, SessionStatus};
use clara_types::commerce::{
    format_order_number, CartItem, CartLine, NewOrder, Order, OrderItem, OrderStatus,
    PaymentStatus,
};
use clara_types::error::RepositoryError;
use clara_types::llm::{CompletionRequest, CompletionResponse, LlmError, StopReason, Usage};

use crate::chat::repository::ChatRepository;
use crate::llm::provider::LlmProvider;
use crate::repository::{CartRepository, OrderRepository, ProductRepository, UserRepository};

#[derive(Default)]
struct State {
    users: Vec<User>,
    products: Vec<Product>,
    cart: Vec<CartItem>,
    orders: Vec<Order>,
    sessions: Vec<ChatSession>,
    messages: Vec<ChatMessage>,
    order_seq: i64,
    next_id: i64,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Mutex-backed store with per-operation fault injection.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    failing: Mutex<HashSet<&'static str>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call to `op` fail with a query error.
    pub fn fail(&self, op: &'static str) {
        self.failing.lock().unwrap().insert(op);
    }

    fn check(&self, op: &'static str) -> Result<(), RepositoryError> {
        if self.failing.lock().unwrap().contains(op) {
            Err(RepositoryError::Query(format!("{op} unavailable")))
        } else {
            Ok(())
        }
    }

    pub fn add_user(&self, first_name: &str, points: i64) -> User {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        let user = User {
            id,
            email: format!("{}@example.com", first_name.to_lowercase()),
            first_name: first_name.to_string(),
            last_name: "Tester".to_string(),
            city: None,
            loyalty_points: points,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        state.users.push(user.clone());
        user
    }

    pub fn set_city(&self, user_id: i64, city: &str) {
        let mut state = self.state.lock().unwrap();
        if let Some(user) = state.users.iter_mut().find(|u| u.id == user_id) {
            user.city = Some(city.to_string());
        }
    }

    /// Insert a product; `price` is whole dollars.
    pub fn add_product(
        &self,
        name: &str,
        occasion: &str,
        price: i64,
        stock: i64,
        colors: &[&str],
    ) -> Product {
        self.add_product_full(name, "dresses", occasion, Decimal::new(price, 0), stock, colors, false)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn add_product_full(
        &self,
        name: &str,
        category: &str,
        occasion: &str,
        price: Decimal,
        stock: i64,
        colors: &[&str],
        featured: bool,
    ) -> Product {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        let product = Product {
            id,
            name: name.to_string(),
            description: format!("{name} description"),
            category: category.to_string(),
            occasion: occasion.to_string(),
            price,
            stock,
            material: None,
            sizes: vec!["S".into(), "M".into(), "L".into()],
            colors: colors.iter().map(|c| c.to_string()).collect(),
            featured,
            image_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        state.products.push(product.clone());
        product
    }

    pub fn add_session(&self, id: &str, user_id: Option<i64>) {
        let mut state = self.state.lock().unwrap();
        state.sessions.push(ChatSession {
            id: id.to_string(),
            user_id,
            channel: Channel::Web,
            status: SessionStatus::Active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        });
    }

    pub fn product_stock(&self, id: i64) -> i64 {
        let state = self.state.lock().unwrap();
        state
            .products
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.stock)
            .unwrap_or(-1)
    }

    pub fn message_count(&self) -> usize {
        self.state.lock().unwrap().messages.len()
    }

    pub fn session_count(&self) -> usize {
        self.state.lock().unwrap().sessions.len()
    }
}

impl UserRepository for MemoryStore {
    async fn get_user(&self, id: i64) -> Result<Option<User>, RepositoryError> {
        self.check("get_user")?;
        let state = self.state.lock().unwrap();
        Ok(state.users.iter().find(|u| u.id == id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        self.check("get_user_by_email")?;
        let state = self.state.lock().unwrap();
        Ok(state
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn create_user(&self, user: &NewUser) -> Result<User, RepositoryError> {
        self.check("create_user")?;
        let created = self.add_user(&user.first_name, user.loyalty_points);
        Ok(created)
    }

    async fn update_loyalty(&self, id: i64, delta_points: i64) -> Result<i64, RepositoryError> {
        self.check("update_loyalty")?;
        let mut state = self.state.lock().unwrap();
        let user = state
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(RepositoryError::NotFound)?;
        user.loyalty_points = (user.loyalty_points + delta_points).max(0);
        Ok(user.loyalty_points)
    }
}

impl ProductRepository for MemoryStore {
    async fn get_product(&self, id: i64) -> Result<Option<Product>, RepositoryError> {
        self.check("get_product")?;
        let state = self.state.lock().unwrap();
        Ok(state.products.iter().find(|p| p.id == id).cloned())
    }

    async fn search_products(&self, query: &ProductQuery) -> Result<Vec<Product>, RepositoryError> {
        self.check("search_products")?;
        let state = self.state.lock().unwrap();
        Ok(state
            .products
            .iter()
            .filter(|p| query.matches(p))
            .cloned()
            .collect())
    }

    async fn create_product(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        self.check("create_product")?;
        let colors: Vec<&str> = product.colors.iter().map(String::as_str).collect();
        Ok(self.add_product_full(
            &product.name,
            &product.category,
            &product.occasion,
            product.price,
            product.stock,
            &colors,
            product.featured,
        ))
    }

    async fn update_stock(&self, id: i64, qty_delta: i64) -> Result<i64, RepositoryError> {
        self.check("update_stock")?;
        let mut state = self.state.lock().unwrap();
        let product = state
            .products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(RepositoryError::NotFound)?;
        product.stock = (product.stock + qty_delta).max(0);
        Ok(product.stock)
    }
}

impl CartRepository for MemoryStore {
    async fn get_cart(&self, user_id: i64) -> Result<Vec<CartLine>, RepositoryError> {
        self.check("get_cart")?;
        let state = self.state.lock().unwrap();
        Ok(state
            .cart
            .iter()
            .filter(|item| item.user_id == user_id)
            .filter_map(|item| {
                state
                    .products
                    .iter()
                    .find(|p| p.id == item.product_id)
                    .map(|product| CartLine {
                        item: item.clone(),
                        product: product.clone(),
                    })
            })
            .collect())
    }

    async fn add_to_cart(
        &self,
        user_id: i64,
        product_id: i64,
        quantity: i64,
    ) -> Result<CartItem, RepositoryError> {
        self.check("add_to_cart")?;
        let mut state = self.state.lock().unwrap();
        if let Some(item) = state
            .cart
            .iter_mut()
            .find(|i| i.user_id == user_id && i.product_id == product_id)
        {
            item.quantity += quantity;
            return Ok(item.clone());
        }
        let id = state.next_id();
        let item = CartItem {
            id,
            user_id,
            product_id,
            quantity,
            added_at: Utc::now(),
        };
        state.cart.push(item.clone());
        Ok(item)
    }

    async fn clear_cart(&self, user_id: i64) -> Result<(), RepositoryError> {
        self.check("clear_cart")?;
        let mut state = self.state.lock().unwrap();
        state.cart.retain(|item| item.user_id != user_id);
        Ok(())
    }
}

impl OrderRepository for MemoryStore {
    async fn create_order(&self, order: &NewOrder) -> Result<Order, RepositoryError> {
        self.check("create_order")?;
        let mut state = self.state.lock().unwrap();
        let claimed: Vec<(i64, i64)> = state
            .cart
            .iter()
            .filter(|item| item.user_id == order.user_id)
            .map(|item| (item.product_id, item.quantity))
            .collect();
        if !order.matches_cart(&claimed) {
            return Err(RepositoryError::Conflict(format!(
                "cart for user {} changed during checkout",
                order.user_id
            )));
        }
        state.cart.retain(|item| item.user_id != order.user_id);
        state.order_seq += 1;
        let date = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
        let order_number = format_order_number(date, state.order_seq);

        for line in &order.lines {
            if let Some(product) = state
                .products
                .iter_mut()
                .find(|p| p.id == line.product.id)
            {
                product.stock = (product.stock - line.item.quantity).max(0);
            }
        }

        let created = Order {
            id: Uuid::now_v7(),
            order_number,
            user_id: order.user_id,
            subtotal: order.totals.subtotal,
            tax: order.totals.tax,
            shipping: order.totals.shipping,
            discount: order.totals.discount,
            final_amount: order.totals.final_amount,
            payment_status: PaymentStatus::Pending,
            payment_method: order.payment_method.clone(),
            transaction_id: None,
            shipping_address: order.shipping_address.clone(),
            billing_address: order.billing_address.clone(),
            status: OrderStatus::Processing,
            tracking_number: None,
            items: order
                .lines
                .iter()
                .map(|line| OrderItem {
                    product_id: line.product.id,
                    product_name: line.product.name.clone(),
                    quantity: line.item.quantity,
                    unit_price: line.product.price,
                    total_price: line.line_total(),
                })
                .collect(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        state.orders.push(created.clone());
        Ok(created)
    }

    async fn get_orders(&self, user_id: i64) -> Result<Vec<Order>, RepositoryError> {
        self.check("get_orders")?;
        let state = self.state.lock().unwrap();
        Ok(state
            .orders
            .iter()
            .rev()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn get_order_by_number(
        &self,
        order_number: &str,
    ) -> Result<Option<Order>, RepositoryError> {
        self.check("get_order_by_number")?;
        let state = self.state.lock().unwrap();
        Ok(state
            .orders
            .iter()
            .find(|o| o.order_number == order_number)
            .cloned())
    }

    async fn mark_paid(&self, order_id: &Uuid, transaction_id: &str) -> Result<(), RepositoryError> {
        self.check("mark_paid")?;
        let mut state = self.state.lock().unwrap();
        let order = state
            .orders
            .iter_mut()
            .find(|o| o.id == *order_id)
            .ok_or(RepositoryError::NotFound)?;
        order.payment_status = PaymentStatus::Paid;
        order.status = OrderStatus::Confirmed;
        order.transaction_id = Some(transaction_id.to_string());
        Ok(())
    }

    async fn update_order_status(
        &self,
        order_id: &Uuid,
        status: OrderStatus,
    ) -> Result<(), RepositoryError> {
        self.check("update_order_status")?;
        let mut state = self.state.lock().unwrap();
        let order = state
            .orders
            .iter_mut()
            .find(|o| o.id == *order_id)
            .ok_or(RepositoryError::NotFound)?;
        order.status = status;
        Ok(())
    }
}

impl ChatRepository for MemoryStore {
    async fn create_session(&self, session: &ChatSession) -> Result<ChatSession, RepositoryError> {
        self.check("create_session")?;
        let mut state = self.state.lock().unwrap();
        if state.sessions.iter().any(|s| s.id == session.id) {
            return Err(RepositoryError::Conflict(session.id.clone()));
        }
        state.sessions.push(session.clone());
        Ok(session.clone())
    }

    async fn get_session(&self, session_id: &str) -> Result<Option<ChatSession>, RepositoryError> {
        self.check("get_session")?;
        let state = self.state.lock().unwrap();
        Ok(state.sessions.iter().find(|s| s.id == session_id).cloned())
    }

    async fn list_sessions(&self, user_id: i64) -> Result<Vec<ChatSession>, RepositoryError> {
        self.check("list_sessions")?;
        let state = self.state.lock().unwrap();
        Ok(state
            .sessions
            .iter()
            .rev()
            .filter(|s| s.user_id == Some(user_id))
            .cloned()
            .collect())
    }

    async fn append_message(
        &self,
        session_id: &str,
        role: ChatRole,
        content: &str,
        agent_tag: Option<&str>,
    ) -> Result<ChatMessage, RepositoryError> {
        self.check("append_message")?;
        let mut state = self.state.lock().unwrap();
        let seq = state
            .messages
            .iter()
            .filter(|m| m.session_id == session_id)
            .map(|m| m.seq)
            .max()
            .unwrap_or(0)
            + 1;
        let message = ChatMessage {
            id: Uuid::now_v7(),
            session_id: session_id.to_string(),
            seq,
            role,
            content: content.to_string(),
            agent_tag: agent_tag.map(str::to_string),
            created_at: Utc::now(),
        };
        state.messages.push(message.clone());
        Ok(message)
    }

    async fn get_history(
        &self,
        session_id: &str,
        limit: u32,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        self.check("get_history")?;
        let state = self.state.lock().unwrap();
        let mut messages: Vec<ChatMessage> = state
            .messages
            .iter()
            .filter(|m| m.session_id == session_id)
            .cloned()
            .collect();
        messages.sort_by_key(|m| m.seq);
        let skip = messages.len().saturating_sub(limit as usize);
        Ok(messages.into_iter().skip(skip).collect())
    }

    async fn get_conversation(
        &self,
        session_id: &str,
        limit: u32,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        self.check("get_conversation")?;
        let state = self.state.lock().unwrap();
        let mut messages: Vec<ChatMessage> = state
            .messages
            .iter()
            .filter(|m| m.session_id == session_id && m.role.is_conversational())
            .cloned()
            .collect();
        messages.sort_by_key(|m| m.seq);
        let skip = messages.len().saturating_sub(limit as usize);
        Ok(messages.into_iter().skip(skip).collect())
    }

    async fn recent_cross_session_messages(
        &self,
        user_id: i64,
        limit: u32,
        exclude_session_id: Option<&str>,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        self.check("recent_cross_session_messages")?;
        let state = self.state.lock().unwrap();
        let owned: HashSet<&str> = state
            .sessions
            .iter()
            .filter(|s| s.user_id == Some(user_id))
            .filter(|s| Some(s.id.as_str()) != exclude_session_id)
            .map(|s| s.id.as_str())
            .collect();
        Ok(state
            .messages
            .iter()
            .rev()
            .filter(|m| owned.contains(m.session_id.as_str()) && m.role.is_conversational())
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

/// Canned reply for [`ScriptedProvider`].
#[derive(Clone)]
pub enum Script {
    Reply(String),
    Fail,
}

/// LLM provider that returns a fixed reply after an optional delay and
/// records every request it receives.
#[derive(Clone)]
pub struct ScriptedProvider {
    script: Script,
    delay: Duration,
    pub requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl ScriptedProvider {
    pub fn replying(text: &str) -> Self {
        Self {
            script: Script::Reply(text.to_string()),
            delay: Duration::ZERO,
            requests: Arc::default(),
        }
    }

    pub fn failing() -> Self {
        Self {
            script: Script::Fail,
            delay: Duration::ZERO,
            requests: Arc::default(),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn default_model(&self) -> &str {
        "scripted-1"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match &self.script {
            Script::Reply(text) => Ok(CompletionResponse {
                id: "resp-1".into(),
                content: text.clone(),
                model: request.model.clone(),
                stop_reason: StopReason::EndTurn,
                usage: Usage::default(),
            }),
            Script::Fail => Err(LlmError::Provider {
                message: "upstream unavailable".into(),
            }),
        }
    }
}
