use thiserror::Error;

/// Ошибки расчётного контура (кошельки, удержания, выплаты)
///
/// Типизированная таксономия: обработчики HTTP транслируют варианты в коды
/// ответов, а плановые обходы логируют и продолжают работу.
#[derive(Debug, Error)]
pub enum SettlementError {
    /// Списание превышает остаток корзины баланса
    #[error("insufficient funds in {bucket} of wallet {wallet}: requested {requested}, available {available}")]
    InsufficientFunds {
        wallet: String,
        bucket: String,
        requested: f64,
        available: f64,
    },

    /// Кошелёк административно заблокирован
    #[error("wallet {0} is locked")]
    WalletLocked(String),

    /// Сущность не найдена (ошибка вызывающей стороны)
    #[error("{0} not found")]
    NotFound(String),

    /// Недопустимый переход состояния; текст причины показывается вызывающему UI
    #[error("{0}")]
    InvalidStateTransition(String),

    /// Сумма распределений по магазинам не сошлась с удержанием платформы.
    /// Фатально для расчёта этого заказа: никогда не корректируется молча.
    #[error("reconciliation mismatch for order {order}: held {expected}, allocated {allocated}")]
    ReconciliationMismatch {
        order: String,
        expected: f64,
        allocated: f64,
    },

    /// Для магазина нет строк к выплате (сигнал, не сбой)
    #[error("nothing to pay out for store {0}")]
    NothingToPayout(String),

    /// Ошибка хранилища или иная внутренняя ошибка
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl SettlementError {
    /// Причина отказа для вызывающего UI (ветвление по тексту)
    pub fn reason(&self) -> String {
        self.to_string()
    }
}
