//! セッション単位の直列化
//!
//! ## 責務
//!
//! - 同一セッションへの変更操作を一つずつ実行させる（セッション間は並行）
//! - イベントの送出順を変更の適用順と一致させる
//!
//! ## 設計ノート
//!
//! セッションごとに二つのロックを持つ。
//!
//! - `state`: 読み込み → 遷移 → 永続化 の間だけ保持する
//! - `publish`: ブロードキャストの間だけ保持する
//!
//! `state` を保持したまま `publish` を取得し、その後 `state` を解放する
//! （ハンドオーバー）。ブロードキャスト中に次の変更が進められる一方で、
//! イベントは変更と同じ順序で送出される。

use std::{collections::HashMap, sync::Arc};

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::SessionId;

#[derive(Default)]
struct Slot {
    state: Arc<Mutex<()>>,
    publish: Arc<Mutex<()>>,
}

/// セッション ID ごとのロック表
///
/// ロックは最初のアクセス時に作られ、セッション終了時に `forget` で破棄される。
#[derive(Default)]
pub struct SessionLocks {
    slots: parking_lot::Mutex<HashMap<SessionId, Arc<Slot>>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, session_id: &SessionId) -> Arc<Slot> {
        Arc::clone(self.slots.lock().entry(session_id.clone()).or_default())
    }

    /// セッションの変更権を取得する
    pub async fn lock(&self, session_id: &SessionId) -> SessionGuard {
        let slot = self.slot(session_id);
        let state = Arc::clone(&slot.state).lock_owned().await;
        SessionGuard { slot, state }
    }

    /// 存在しないセッションの変更権を返却する
    ///
    /// 他に使用者がいなければロックも表から消す。未知の ID で表が膨らまない。
    pub fn discard(&self, session_id: &SessionId, guard: SessionGuard) {
        let SessionGuard { slot, state } = guard;
        drop(state);

        let mut slots = self.slots.lock();
        let vacant = slots
            .get(session_id)
            .is_some_and(|current| Arc::ptr_eq(current, &slot) && Arc::strong_count(&slot) == 2);
        if vacant {
            slots.remove(session_id);
        }
    }

    /// 削除されたセッションのロックを破棄する
    pub fn forget(&self, session_id: &SessionId) {
        self.slots.lock().remove(session_id);
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.slots.lock().len()
    }
}

/// セッションの変更権
pub struct SessionGuard {
    slot: Arc<Slot>,
    state: OwnedMutexGuard<()>,
}

impl SessionGuard {
    /// 変更権を手放し、送出の順番を受け取る
    pub async fn into_publish_turn(self) -> PublishTurn {
        let SessionGuard { slot, state } = self;
        let turn = Arc::clone(&slot.publish).lock_owned().await;
        drop(state);
        PublishTurn { _turn: turn }
    }
}

/// 送出の順番。drop で次の変更の送出が始まる。
pub struct PublishTurn {
    _turn: OwnedMutexGuard<()>,
}
