//! IdGenerator port - ID 生成の抽象化
//!
//! # 実装
//! - **UlidGenerator**: ULID ベース（本番用）

use crate::domain::ids::InvocationId;
use crate::ports::Clock;
use ulid::Ulid;

/// IdGenerator は invocation ごとの ID を生成
///
/// # Thread Safety
/// - `Send + Sync` を要求（複数の invocation から共有される）
pub trait IdGenerator: Send + Sync {
    fn generate_invocation_id(&self) -> InvocationId;
}

/// UlidGenerator は ULID ベースの ID 生成器
///
/// Clock を使って時刻部分を決めるので、FixedClock を渡せば
/// timestamp 部分が決定的になる。
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn generate_invocation_id(&self) -> InvocationId {
        let timestamp_ms = self.clock.now().timestamp_millis() as u64;
        let ulid = Ulid::from_parts(timestamp_ms, rand::random());
        InvocationId::from(ulid)
    }
}
