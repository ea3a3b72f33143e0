//! In-memory knowledge base.
//!
//! Ranks entries by the share of query terms they contain. Seeded with
//! LipaChat product, FAQ and troubleshooting content.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::knowledge::KnowledgeSnippet;
use crate::ports::{KnowledgeError, KnowledgeStore};

const STOPWORDS: &[&str] = &[
    "the", "and", "for", "you", "your", "how", "can", "what", "are", "with", "this", "that", "does",
    "from", "have", "has", "was", "why", "who", "when", "where", "which", "our", "not", "but",
    "its", "it's", "into", "about", "there", "their", "they", "will", "would", "should", "could",
    "please", "help", "need", "want", "get",
];

#[derive(Debug, Clone)]
struct Entry {
    source_id: String,
    text: String,
    terms: HashSet<String>,
}

impl Entry {
    fn new(source_id: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        let terms = terms(&text);
        Self {
            source_id: source_id.into(),
            text,
            terms,
        }
    }
}

/// Keyword-overlap knowledge store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryKnowledgeBase {
    entries: Arc<RwLock<Vec<Entry>>>,
}

impl InMemoryKnowledgeBase {
    /// An empty knowledge base.
    pub fn new() -> Self {
        Self::default()
    }

    /// A knowledge base holding the bundled LipaChat content.
    pub fn seeded() -> Self {
        let entries = seed_entries()
            .into_iter()
            .map(|(id, text)| Entry::new(id, text))
            .collect();
        Self {
            entries: Arc::new(RwLock::new(entries)),
        }
    }

    /// Adds or replaces the entry with `source_id`.
    pub async fn upsert(&self, source_id: impl Into<String>, text: impl Into<String>) {
        let entry = Entry::new(source_id, text);
        let mut entries = self.entries.write().await;
        entries.retain(|e| e.source_id != entry.source_id);
        entries.push(entry);
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl KnowledgeStore for InMemoryKnowledgeBase {
    async fn query(&self, text: &str, top_k: usize) -> Result<Vec<KnowledgeSnippet>, KnowledgeError> {
        let wanted = terms(text);
        if wanted.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }

        let entries = self.entries.read().await;
        let mut hits: Vec<KnowledgeSnippet> = entries
            .iter()
            .filter_map(|entry| {
                let overlap = wanted.intersection(&entry.terms).count();
                (overlap > 0).then(|| {
                    KnowledgeSnippet::new(
                        entry.source_id.clone(),
                        entry.text.clone(),
                        overlap as f64 / wanted.len() as f64,
                    )
                })
            })
            .collect();

        hits.sort_by(|a, b| {
            b.relevance
                .total_cmp(&a.relevance)
                .then_with(|| a.source_id.cmp(&b.source_id))
        });
        hits.truncate(top_k);
        Ok(hits)
    }
}

/// Lowercased content words, with a crude plural strip.
fn terms(text: &str) -> HashSet<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '-'))
        .map(|w| w.trim_matches('-').to_lowercase())
        .filter(|w| w.chars().count() > 2 && !STOPWORDS.contains(&w.as_str()))
        .map(|w| match w.strip_suffix('s') {
            Some(stem) if stem.chars().count() > 3 => stem.to_string(),
            _ => w,
        })
        .collect()
}

fn seed_entries() -> Vec<(&'static str, &'static str)> {
    vec![
        (
            "product-lipachat-messenger",
            "LipaChat Messenger is a secure messaging app with integrated payment features. \
             Features: end-to-end encrypted messaging, voice and video calls, mobile money \
             integration, group chats up to 1000 members, file sharing up to 100MB. \
             Pricing: Basic is free, Premium is Ksh 299/month, Business is Ksh 999/month. \
             Available on Android, iOS and Web.",
        ),
        (
            "product-lipapay",
            "LipaPay is a digital payment solution for businesses. Features: payment processing, \
             invoice generation, transaction reports, multi-currency support, API integration. \
             Pricing: Starter 1.5% per transaction, Growth 1.2% per transaction plus Ksh \
             1999/month, Enterprise custom pricing. Available on the web dashboard, Android, \
             iOS and API.",
        ),
        (
            "faq-reset-password",
            "How do I reset my password? Go to the login screen and tap 'Forgot Password'. \
             Enter your registered email address and we will send you a password reset link.",
        ),
        (
            "faq-send-money",
            "How do I send money through LipaChat? Open a chat with the recipient, tap the + \
             icon, select 'Send Money', enter the amount, select a payment method and confirm \
             the transaction with your PIN.",
        ),
        (
            "faq-security",
            "Is LipaChat secure? Yes. LipaChat uses end-to-end encryption for all messages and \
             calls. Payments use bank-grade security protocols and payment details are not \
             stored on our servers.",
        ),
        (
            "faq-payment-methods",
            "Which payment methods are supported? LipaChat supports M-Pesa, Airtel Money, \
             T-Kash, bank transfers and major credit or debit cards including Visa and \
             Mastercard.",
        ),
        (
            "faq-upgrade-premium",
            "How do I upgrade to Premium? Go to Settings > Account > Subscription, select the \
             Premium plan, choose your payment method and follow the prompts to complete your \
             purchase.",
        ),
        (
            "troubleshooting-send-messages",
            "Unable to send messages: check your internet connection, make sure the app is \
             updated to the latest version, restart the app, check whether the recipient has \
             blocked you, try logging out and logging back in.",
        ),
        (
            "troubleshooting-payment-failed",
            "Payment failed: make sure you have sufficient funds, check that your payment method \
             is active and not expired, verify the payment details you entered, try an \
             alternative payment method, wait a few minutes and try again.",
        ),
        (
            "troubleshooting-app-crash",
            "App crashes on startup: update to the latest version, clear the app cache, restart \
             your device, uninstall and reinstall the app, check device storage space.",
        ),
    ]
}
