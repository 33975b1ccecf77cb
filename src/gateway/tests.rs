use super::*;
use crate::format::t;
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, NaiveDate, TimeZone, Utc};
use cuentas_core::{
    clock::ManualClock,
    error::CuentasError,
    finance::{
        Balance, CategoryTotal, NewRule, NewTransaction, Rule, Summary, Transaction,
        TransactionFilter,
    },
    intent::{ClassifiedIntent, IntentKind, TransactionType},
    message::{ConversationEntry, Role},
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex as StdMutex;

const USER: &str = "telegram:42";

// --- Fakes ---

/// Classifier answering from a fixed text → intents table.
#[derive(Default)]
struct ScriptedClassifier {
    script: HashMap<String, Vec<ClassifiedIntent>>,
    contexts: StdMutex<Vec<Vec<ConversationEntry>>>,
}

impl ScriptedClassifier {
    fn on(mut self, text: &str, intents: Vec<ClassifiedIntent>) -> Self {
        self.script.insert(text.to_string(), intents);
        self
    }

    fn calls(&self) -> usize {
        self.contexts.lock().unwrap().len()
    }

    fn last_context(&self) -> Vec<ConversationEntry> {
        self.contexts.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl IntentClassifier for ScriptedClassifier {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn classify(
        &self,
        text: &str,
        context: &[ConversationEntry],
    ) -> Result<Vec<ClassifiedIntent>, CuentasError> {
        self.contexts.lock().unwrap().push(context.to_vec());
        self.script
            .get(text)
            .cloned()
            .ok_or_else(|| CuentasError::Classifier(format!("no script for {text:?}")))
    }
}

/// Backend recording every write.
#[derive(Default)]
struct RecordingBackend {
    created: StdMutex<Vec<(String, NewTransaction)>>,
    create_attempts: AtomicUsize,
    deleted: StdMutex<Vec<String>>,
    search_results: Vec<Transaction>,
    failing_category: Option<String>,
    panic_on_balance: bool,
    balance: Balance,
}

impl RecordingBackend {
    fn created(&self) -> Vec<NewTransaction> {
        self.created
            .lock()
            .unwrap()
            .iter()
            .map(|(_, tx)| tx.clone())
            .collect()
    }

    fn attempts(&self) -> usize {
        self.create_attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FinancialBackend for RecordingBackend {
    async fn create_transaction(
        &self,
        user_id: &str,
        tx: &NewTransaction,
    ) -> Result<Transaction, CuentasError> {
        let n = self.create_attempts.fetch_add(1, Ordering::SeqCst);
        if self.failing_category.as_deref() == Some(tx.category.as_str()) {
            return Err(CuentasError::Backend("HTTP 500: boom".to_string()));
        }
        self.created
            .lock()
            .unwrap()
            .push((user_id.to_string(), tx.clone()));
        Ok(Transaction {
            id: format!("tx-{n}"),
            amount: tx.amount,
            transaction_type: tx.transaction_type,
            category: tx.category.clone(),
            description: tx.description.clone(),
            date: tx.date,
        })
    }

    async fn list_transactions(
        &self,
        _user_id: &str,
        _filter: &TransactionFilter,
    ) -> Result<Vec<Transaction>, CuentasError> {
        Ok(Vec::new())
    }

    async fn search_transactions(
        &self,
        _user_id: &str,
        _query: &str,
    ) -> Result<Vec<Transaction>, CuentasError> {
        Ok(self.search_results.clone())
    }

    async fn delete_transaction(&self, _user_id: &str, id: &str) -> Result<(), CuentasError> {
        self.deleted.lock().unwrap().push(id.to_string());
        Ok(())
    }

    async fn balance(&self, _user_id: &str) -> Result<Balance, CuentasError> {
        if self.panic_on_balance {
            panic!("balance exploded");
        }
        Ok(self.balance.clone())
    }

    async fn summary(&self, _user_id: &str, period: &str) -> Result<Summary, CuentasError> {
        Ok(Summary {
            period: period.to_string(),
            total_income: 4_000_000.0,
            total_expenses: 1_250_000.0,
            by_category: vec![
                CategoryTotal {
                    category: "arriendo".to_string(),
                    total: 900_000.0,
                },
                CategoryTotal {
                    category: "comida".to_string(),
                    total: 350_000.0,
                },
            ],
        })
    }

    async fn create_rule(&self, _user_id: &str, rule: &NewRule) -> Result<Rule, CuentasError> {
        Ok(Rule {
            id: "r1".to_string(),
            category: rule.category.clone(),
            amount: rule.amount,
            transaction_type: rule.transaction_type,
            frequency: rule.frequency.clone(),
            description: rule.description.clone(),
        })
    }

    async fn list_rules(&self, _user_id: &str) -> Result<Vec<Rule>, CuentasError> {
        Ok(Vec::new())
    }
}

#[derive(Default)]
struct FakeHumanizer {
    fail: bool,
    calls: AtomicUsize,
}

#[async_trait]
impl Humanizer for FakeHumanizer {
    async fn humanize(
        &self,
        _raw_reply: &str,
        _original_query: &str,
        _kind: IntentKind,
    ) -> Result<String, CuentasError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(CuentasError::Humanizer("timeout".to_string()))
        } else {
            Ok("Resumen amable".to_string())
        }
    }
}

// --- Harness ---

struct Harness {
    processor: Arc<Processor>,
    classifier: Arc<ScriptedClassifier>,
    backend: Arc<RecordingBackend>,
    clock: Arc<ManualClock>,
}

fn harness(classifier: ScriptedClassifier, backend: RecordingBackend) -> Harness {
    harness_with(Config::default(), classifier, backend, |p| p)
}

fn harness_with(
    config: Config,
    classifier: ScriptedClassifier,
    backend: RecordingBackend,
    customize: impl FnOnce(Processor) -> Processor,
) -> Harness {
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap(),
    ));
    let classifier = Arc::new(classifier);
    let backend = Arc::new(backend);
    let processor = Processor::new(config, classifier.clone(), backend.clone(), clock.clone());
    Harness {
        processor: Arc::new(customize(processor)),
        classifier,
        backend,
        clock,
    }
}

fn expense(amount: f64, category: &str) -> ClassifiedIntent {
    ClassifiedIntent::new(IntentKind::CreateExpense)
        .with_amount(amount)
        .with_category(category)
}

fn income(amount: f64, category: &str) -> ClassifiedIntent {
    ClassifiedIntent::new(IntentKind::CreateIncome)
        .with_amount(amount)
        .with_category(category)
}

fn stored(id: &str, amount: f64, category: &str) -> Transaction {
    Transaction {
        id: id.to_string(),
        amount,
        transaction_type: TransactionType::Expense,
        category: category.to_string(),
        description: Some("uber".to_string()),
        date: NaiveDate::from_ymd_opt(2025, 3, 9),
    }
}

// --- End-to-end scenarios ---

#[tokio::test]
async fn test_small_expense_executes_immediately() {
    let h = harness(
        ScriptedClassifier::default().on("Gasté 50000 en comida", vec![expense(50_000.0, "comida")]),
        RecordingBackend::default(),
    );

    let reply = h.processor.process_message(USER, "Gasté 50000 en comida").await;

    assert!(reply.contains("50,000"), "reply: {reply}");
    assert!(reply.contains("comida"));
    assert!(!reply.contains("¿Confirmas?"));
    let created = h.backend.created();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].amount, 50_000.0);
    assert_eq!(h.processor.pending_count(), 0);
}

#[tokio::test]
async fn test_large_expense_waits_for_yes() {
    let h = harness(
        ScriptedClassifier::default().on(
            "Gasté 5000000 en tecnología",
            vec![expense(5_000_000.0, "tecnología")],
        ),
        RecordingBackend::default(),
    );

    let prompt = h
        .processor
        .process_message(USER, "Gasté 5000000 en tecnología")
        .await;
    assert!(prompt.contains("¿Confirmas?"), "prompt: {prompt}");
    assert!(prompt.contains("$5,000,000"));
    assert_eq!(h.backend.attempts(), 0);
    assert_eq!(h.processor.pending_count(), 1);

    let reply = h.processor.process_message(USER, "sí").await;
    assert!(reply.contains("registrado"), "reply: {reply}");
    let created = h.backend.created();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].amount, 5_000_000.0);
    assert_eq!(created[0].category, "tecnología");
    assert_eq!(h.processor.pending_count(), 0);
    assert!(h.processor.gate.peek(USER).is_none());
}

#[tokio::test]
async fn test_large_expense_cancelled() {
    let h = harness(
        ScriptedClassifier::default().on(
            "Gasté 5000000 en tecnología",
            vec![expense(5_000_000.0, "tecnología")],
        ),
        RecordingBackend::default(),
    );

    h.processor
        .process_message(USER, "Gasté 5000000 en tecnología")
        .await;
    let reply = h.processor.process_message(USER, "cancelar").await;

    assert_eq!(reply, t("cancelled"));
    assert_eq!(h.backend.attempts(), 0);
    assert_eq!(h.processor.pending_count(), 0);
    assert!(!h.processor.gate.holds(USER));
}

#[tokio::test]
async fn test_mixed_batch_is_deferred_then_fully_executed() {
    let text = "Gasté 30000 en comida y recibí 4000000 de sueldo";
    let h = harness(
        ScriptedClassifier::default().on(
            text,
            vec![expense(30_000.0, "comida"), income(4_000_000.0, "sueldo")],
        ),
        RecordingBackend::default(),
    );

    let prompt = h.processor.process_message(USER, text).await;
    assert!(prompt.contains("2 operaciones"), "prompt: {prompt}");
    assert!(prompt.contains("Total gastos: $30,000"));
    assert!(prompt.contains("Total ingresos: $4,000,000"));
    assert_eq!(h.backend.attempts(), 0);

    let reply = h.processor.process_message(USER, "sí").await;
    let created = h.backend.created();
    assert_eq!(created.len(), 2);
    assert_eq!(created[0].transaction_type, TransactionType::Expense);
    assert_eq!(created[0].amount, 30_000.0);
    assert_eq!(created[1].transaction_type, TransactionType::Income);
    assert_eq!(created[1].amount, 4_000_000.0);
    assert!(reply.contains("2 de 2 operaciones completadas"), "reply: {reply}");
    assert_eq!(h.processor.pending_count(), 0);
}

// --- Confirmation flow ---

#[tokio::test]
async fn test_under_threshold_item_is_not_executed_before_decision() {
    let h = harness(
        ScriptedClassifier::default().on(
            "dos gastos",
            vec![expense(500_000.0, "mercado"), expense(4_000_000.0, "viaje")],
        ),
        RecordingBackend::default(),
    );

    h.processor.process_message(USER, "dos gastos").await;
    assert_eq!(h.backend.attempts(), 0);

    h.processor.process_message(USER, "no").await;
    assert_eq!(h.backend.attempts(), 0);
}

#[tokio::test]
async fn test_confirm_after_expiry_executes_nothing() {
    let h = harness(
        ScriptedClassifier::default().on("carro", vec![expense(8_000_000.0, "carro")]),
        RecordingBackend::default(),
    );

    h.processor.process_message(USER, "carro").await;
    h.clock.advance(ChronoDuration::seconds(61));

    let reply = h.processor.process_message(USER, "sí").await;
    assert_eq!(reply, t("confirmation_expired"));
    assert_eq!(h.backend.attempts(), 0);
    assert!(h.processor.gate.peek(USER).is_none());
    assert_eq!(h.processor.pending_count(), 0);
}

#[tokio::test]
async fn test_cancel_after_expiry_reports_expired() {
    let h = harness(
        ScriptedClassifier::default().on("carro", vec![expense(8_000_000.0, "carro")]),
        RecordingBackend::default(),
    );

    h.processor.process_message(USER, "carro").await;
    h.clock.advance(ChronoDuration::seconds(61));

    let reply = h.processor.process_message(USER, "no").await;
    assert_ne!(reply, t("cancelled"));
    assert_eq!(reply, t("confirmation_expired"));
    assert_eq!(h.backend.attempts(), 0);
    assert!(!h.processor.gate.holds(USER));

    h.processor.process_message(USER, "carro").await;
    h.clock.advance(ChronoDuration::seconds(120));
    assert_eq!(
        h.processor.process_message(USER, "/cancelar").await,
        t("confirmation_expired")
    );
}

#[tokio::test]
async fn test_confirm_word_without_pending_goes_to_classifier() {
    let h = harness(ScriptedClassifier::default(), RecordingBackend::default());

    let reply = h.processor.process_message(USER, "sí").await;

    assert_eq!(reply, t("didnt_understand"));
    assert_eq!(h.classifier.calls(), 1);
    assert_eq!(h.backend.attempts(), 0);
}

#[tokio::test]
async fn test_confirm_and_cancel_commands_with_nothing_pending() {
    let h = harness(ScriptedClassifier::default(), RecordingBackend::default());

    assert_eq!(
        h.processor.process_message(USER, "/confirmar").await,
        t("nothing_to_confirm")
    );
    assert_eq!(
        h.processor.process_message(USER, "/cancelar").await,
        t("nothing_to_cancel")
    );
    assert_eq!(h.classifier.calls(), 0);
}

#[tokio::test]
async fn test_unclear_reply_is_a_new_request_and_keeps_pending() {
    let h = harness(
        ScriptedClassifier::default()
            .on("carro", vec![expense(8_000_000.0, "carro")])
            .on(
                "¿cuál es mi saldo?",
                vec![ClassifiedIntent::new(IntentKind::GetBalance)],
            ),
        RecordingBackend {
            balance: Balance {
                total_income: 10_000_000.0,
                total_expenses: 2_000_000.0,
                balance: 8_000_000.0,
            },
            ..Default::default()
        },
    );

    h.processor.process_message(USER, "carro").await;
    let reply = h.processor.process_message(USER, "¿cuál es mi saldo?").await;
    assert!(reply.contains("saldo actual"), "reply: {reply}");
    assert_eq!(h.processor.pending_count(), 1);

    h.processor.process_message(USER, "dale").await;
    assert_eq!(h.backend.created().len(), 1);
}

#[tokio::test]
async fn test_new_large_request_replaces_pending() {
    let h = harness(
        ScriptedClassifier::default()
            .on("primero", vec![expense(5_000_000.0, "tv")])
            .on("segundo", vec![expense(6_000_000.0, "nevera")]),
        RecordingBackend::default(),
    );

    h.processor.process_message(USER, "primero").await;
    h.processor.process_message(USER, "segundo").await;
    assert_eq!(h.processor.pending_count(), 1);

    h.processor.process_message(USER, "ok").await;
    let created = h.backend.created();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].amount, 6_000_000.0);
    assert_eq!(created[0].category, "nevera");
}

#[tokio::test]
async fn test_pending_command_shows_prompt() {
    let h = harness(
        ScriptedClassifier::default().on("carro", vec![expense(8_000_000.0, "carro")]),
        RecordingBackend::default(),
    );

    assert_eq!(
        h.processor.process_message(USER, "/pendiente").await,
        t("no_pending")
    );
    h.processor.process_message(USER, "carro").await;
    let shown = h.processor.process_message(USER, "/pendiente").await;
    assert!(shown.contains("$8,000,000"));
    assert_eq!(h.processor.pending_count(), 1);
}

// --- Dispatch ---

#[tokio::test]
async fn test_batch_failure_does_not_stop_later_items() {
    let h = harness(
        ScriptedClassifier::default().on(
            "tres gastos",
            vec![
                expense(10_000.0, "café"),
                expense(20_000.0, "falla"),
                expense(30_000.0, "taxi"),
            ],
        ),
        RecordingBackend {
            failing_category: Some("falla".to_string()),
            ..Default::default()
        },
    );

    let reply = h.processor.process_message(USER, "tres gastos").await;

    assert_eq!(h.backend.attempts(), 3);
    assert_eq!(h.backend.created().len(), 2);
    assert!(reply.contains("❌"), "reply: {reply}");
    assert!(reply.contains("2 de 3 operaciones completadas"));
    assert!(!reply.contains("500"));
}

#[tokio::test]
async fn test_classifier_failure_degrades_to_question() {
    let h = harness(ScriptedClassifier::default(), RecordingBackend::default());

    let reply = h.processor.process_message(USER, "asdf qwerty").await;

    assert_eq!(reply, t("didnt_understand"));
    assert_eq!(h.backend.attempts(), 0);
}

#[tokio::test]
async fn test_question_passes_canned_response_through() {
    let h = harness(
        ScriptedClassifier::default().on(
            "hola",
            vec![ClassifiedIntent::question("¡Hola! ¿En qué te ayudo?")],
        ),
        RecordingBackend::default(),
    );

    assert_eq!(
        h.processor.process_message(USER, "hola").await,
        "¡Hola! ¿En qué te ayudo?"
    );
}

#[tokio::test]
async fn test_panic_in_dispatch_is_contained() {
    let h = harness(
        ScriptedClassifier::default()
            .on("saldo", vec![ClassifiedIntent::new(IntentKind::GetBalance)])
            .on("Gasté 50000 en comida", vec![expense(50_000.0, "comida")]),
        RecordingBackend {
            panic_on_balance: true,
            ..Default::default()
        },
    );

    let reply = h.processor.process_message(USER, "saldo").await;
    assert_eq!(reply, t("apology"));

    let next = h.processor.process_message(USER, "Gasté 50000 en comida").await;
    assert!(next.contains("50,000"));
}

#[tokio::test]
async fn test_affordability_check_never_defers_or_writes() {
    let mut check = ClassifiedIntent::new(IntentKind::ValidateExpense).with_amount(5_000_000.0);
    check.description = Some("portátil".to_string());
    let h = harness(
        ScriptedClassifier::default().on("¿me alcanza?", vec![check]),
        RecordingBackend {
            balance: Balance {
                total_income: 12_000_000.0,
                total_expenses: 2_000_000.0,
                balance: 10_000_000.0,
            },
            ..Default::default()
        },
    );

    let reply = h.processor.process_message(USER, "¿me alcanza?").await;

    assert!(reply.contains("Sí te alcanza"), "reply: {reply}");
    assert_eq!(h.processor.pending_count(), 0);
    assert_eq!(h.backend.attempts(), 0);
}

#[tokio::test]
async fn test_delete_by_description_single_match() {
    let mut intent = ClassifiedIntent::new(IntentKind::DeleteTransaction);
    intent.description = Some("uber".to_string());
    let h = harness(
        ScriptedClassifier::default().on("borra el uber", vec![intent]),
        RecordingBackend {
            search_results: vec![stored("t-9", 18_000.0, "transporte")],
            ..Default::default()
        },
    );

    let reply = h.processor.process_message(USER, "borra el uber").await;

    assert!(reply.contains("Eliminé"), "reply: {reply}");
    assert_eq!(*h.backend.deleted.lock().unwrap(), vec!["t-9".to_string()]);
}

#[tokio::test]
async fn test_delete_by_description_ambiguous_lists_matches() {
    let h = harness(
        ScriptedClassifier::default().on(
            "borra el uber",
            vec![ClassifiedIntent::new(IntentKind::DeleteTransaction).with_query("uber")],
        ),
        RecordingBackend {
            search_results: vec![
                stored("t-1", 18_000.0, "transporte"),
                stored("t-2", 22_000.0, "transporte"),
            ],
            ..Default::default()
        },
    );

    let reply = h.processor.process_message(USER, "borra el uber").await;

    assert!(reply.contains("[ref t-1]"));
    assert!(reply.contains("[ref t-2]"));
    assert!(h.backend.deleted.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_accounts_map_user_key_to_backend_id() {
    let mut config = Config::default();
    config
        .accounts
        .insert(USER.to_string(), "backend-7".to_string());
    let h = harness_with(
        config,
        ScriptedClassifier::default().on("café", vec![expense(8_000.0, "café")]),
        RecordingBackend::default(),
        |p| p,
    );

    h.processor.process_message(USER, "café").await;

    let created = h.backend.created.lock().unwrap();
    assert_eq!(created[0].0, "backend-7");
}

// --- Conversation window ---

#[tokio::test]
async fn test_window_records_both_turns() {
    let h = harness(
        ScriptedClassifier::default().on("Gasté 50000 en comida", vec![expense(50_000.0, "comida")]),
        RecordingBackend::default(),
    );

    h.processor.process_message(USER, "Gasté 50000 en comida").await;

    let context = h.classifier.last_context();
    assert_eq!(context.len(), 1);
    assert_eq!(context[0].content, "Gasté 50000 en comida");

    let window = h.processor.window.snapshot(USER);
    assert_eq!(window.len(), 2);
    assert_eq!(window[0].role, Role::User);
    assert_eq!(window[1].role, Role::Assistant);
    assert!(window[1].content.contains("50,000"));
}

#[tokio::test]
async fn test_window_wiped_after_inactivity() {
    let h = harness(
        ScriptedClassifier::default()
            .on("uno", vec![expense(1_000.0, "a")])
            .on("dos", vec![expense(2_000.0, "b")]),
        RecordingBackend::default(),
    );

    h.processor.process_message(USER, "uno").await;
    h.clock.advance(ChronoDuration::minutes(31));
    h.processor.process_message(USER, "dos").await;

    let context = h.classifier.last_context();
    assert_eq!(context.len(), 1);
    assert_eq!(context[0].content, "dos");
}

#[tokio::test]
async fn test_window_never_exceeds_ten_entries() {
    let h = harness(ScriptedClassifier::default(), RecordingBackend::default());

    for i in 0..8 {
        h.processor.process_message(USER, &format!("mensaje {i}")).await;
    }

    let window = h.processor.window.snapshot(USER);
    assert_eq!(window.len(), 10);
    assert_eq!(window[0].content, "mensaje 3");
}

#[tokio::test]
async fn test_forget_command_clears_window() {
    let h = harness(ScriptedClassifier::default(), RecordingBackend::default());

    h.processor.process_message(USER, "algo").await;
    assert!(!h.processor.window.snapshot(USER).is_empty());

    let reply = h.processor.process_message(USER, "/olvidar").await;
    assert_eq!(reply, t("conversation_cleared"));
    assert!(h.processor.window.snapshot(USER).is_empty());
}

// --- Humanizer ---

fn humanizing_config() -> Config {
    let mut config = Config::default();
    config.humanizer.min_length = 10;
    config
}

#[tokio::test]
async fn test_humanizer_rewrites_long_summary() {
    let humanizer = Arc::new(FakeHumanizer::default());
    let h = harness_with(
        humanizing_config(),
        ScriptedClassifier::default().on(
            "resumen del mes",
            vec![ClassifiedIntent::new(IntentKind::GetSummary)],
        ),
        RecordingBackend::default(),
        {
            let humanizer = humanizer.clone();
            move |p| p.with_humanizer(humanizer)
        },
    );

    let reply = h.processor.process_message(USER, "resumen del mes").await;

    assert_eq!(reply, "Resumen amable");
    assert_eq!(humanizer.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_humanizer_failure_keeps_raw_reply() {
    let h = harness_with(
        humanizing_config(),
        ScriptedClassifier::default().on(
            "resumen del mes",
            vec![ClassifiedIntent::new(IntentKind::GetSummary)],
        ),
        RecordingBackend::default(),
        |p| {
            p.with_humanizer(Arc::new(FakeHumanizer {
                fail: true,
                ..Default::default()
            }))
        },
    );

    let reply = h.processor.process_message(USER, "resumen del mes").await;

    assert!(reply.contains("Resumen del mes"), "reply: {reply}");
    assert!(reply.contains("arriendo"));
}

#[tokio::test]
async fn test_humanizer_skipped_for_filtered_listing() {
    let humanizer = Arc::new(FakeHumanizer::default());
    let h = harness_with(
        humanizing_config(),
        ScriptedClassifier::default().on(
            "gastos de comida",
            vec![ClassifiedIntent::new(IntentKind::ListTransactions).with_category("comida")],
        ),
        RecordingBackend::default(),
        {
            let humanizer = humanizer.clone();
            move |p| p.with_humanizer(humanizer)
        },
    );

    let reply = h.processor.process_message(USER, "gastos de comida").await;

    assert_eq!(reply, t("no_transactions"));
    assert_eq!(humanizer.calls.load(Ordering::SeqCst), 0);
}

// --- Concurrency and housekeeping ---

#[tokio::test]
async fn test_users_are_isolated() {
    const OTHER: &str = "telegram:99";
    let h = harness(
        ScriptedClassifier::default().on("carro", vec![expense(8_000_000.0, "carro")]),
        RecordingBackend::default(),
    );

    let (a, b) = tokio::join!(
        h.processor.process_message(USER, "carro"),
        h.processor.process_message(OTHER, "carro"),
    );
    assert!(a.contains("¿Confirmas?"));
    assert!(b.contains("¿Confirmas?"));
    assert_eq!(h.processor.pending_count(), 2);

    h.processor.process_message(USER, "sí").await;
    assert_eq!(h.backend.created().len(), 1);
    assert_eq!(h.processor.pending_count(), 1);
    assert!(h.processor.gate.peek(OTHER).is_some());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_same_user_turns_are_serialized() {
    let h = harness(
        ScriptedClassifier::default().on("café", vec![expense(5_000.0, "café")]),
        RecordingBackend::default(),
    );

    let mut handles = Vec::new();
    for _ in 0..5 {
        let processor = h.processor.clone();
        handles.push(tokio::spawn(async move {
            processor.process_message(USER, "café").await
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(h.backend.created().len(), 5);
    let window = h.processor.window.snapshot(USER);
    assert_eq!(window.len(), 10);
    for pair in window.chunks(2) {
        assert_eq!(pair[0].role, Role::User);
        assert_eq!(pair[1].role, Role::Assistant);
    }
}

#[tokio::test]
async fn test_sweep_drops_expired_confirmations() {
    let h = harness(
        ScriptedClassifier::default().on("carro", vec![expense(8_000_000.0, "carro")]),
        RecordingBackend::default(),
    );

    h.processor.process_message(USER, "carro").await;
    h.clock.advance(ChronoDuration::seconds(60));
    h.processor.sweep();

    assert!(!h.processor.gate.holds(USER));
    assert_eq!(h.processor.pending_count(), 0);
}

#[tokio::test]
async fn test_audit_records_each_turn() {
    let opts = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(opts)
        .await
        .unwrap();
    let audit = AuditLogger::with_pool(pool).await.unwrap();

    let h = harness_with(
        Config::default(),
        ScriptedClassifier::default().on("carro", vec![expense(8_000_000.0, "carro")]),
        RecordingBackend::default(),
        {
            let audit = audit.clone();
            move |p| p.with_audit(audit)
        },
    );

    h.processor.process_message(USER, "carro").await;
    h.processor.process_message(USER, "cancelar").await;

    assert_eq!(audit.count_for(USER).await.unwrap(), 2);
}
