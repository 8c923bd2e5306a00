//! 重试资格判定
//!
//! 根据 (操作名称, 失败分类) 判断一次失败的调用是否可以安全重试：
//! 失败必须是暂时性的，且操作必须是幂等的（重放不会重复产生副作用）

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::types::{FailureClass, OperationName};

/// 重试资格判定 trait
///
/// 实现必须是纯查询，无副作用，可被并发调用
pub trait EligibilityClassifier: fmt::Debug + Send + Sync {
    fn is_eligible(&self, operation: &OperationName, failure: FailureClass) -> bool;
}

/// 默认资格表
///
/// 只有 `Unavailable` 与 `Internal` 可重试。`Cancelled` 可能是客户端自己取消产生的，
/// `DeadlineExceeded` 表示调用方的截止时间已到，二者都不重试
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DefaultEligibility;

impl EligibilityClassifier for DefaultEligibility {
    fn is_eligible(&self, operation: &OperationName, failure: FailureClass) -> bool {
        matches!(failure, FailureClass::Unavailable | FailureClass::Internal)
            && is_idempotent(operation)
    }
}

/// 截止时间感知的资格表
///
/// 与默认表相同，但 `DeadlineExceeded` 也可重试。
/// 只能与自身限制总耗时的策略（如 `TimeoutAwareFixedCountRetryStrategy`）搭配使用
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeadlineAwareEligibility;

impl EligibilityClassifier for DeadlineAwareEligibility {
    fn is_eligible(&self, operation: &OperationName, failure: FailureClass) -> bool {
        matches!(
            failure,
            FailureClass::Unavailable | FailureClass::Internal | FailureClass::DeadlineExceeded
        ) && is_idempotent(operation)
    }
}

/// 可在配置中选择的标准资格表
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EligibilityTable {
    #[default]
    Default,
    DeadlineAware,
}

impl EligibilityTable {
    pub fn classifier(self) -> Arc<dyn EligibilityClassifier> {
        match self {
            EligibilityTable::Default => Arc::new(DefaultEligibility),
            EligibilityTable::DeadlineAware => Arc::new(DeadlineAwareEligibility),
        }
    }
}

/// 操作是否幂等
///
/// 自增、TTL 更新、列表推入/弹出重放会重复生效；条件写入重放时可能观察到不同的前置条件。
/// 未登记的操作一律视为不可重试
pub fn is_idempotent(operation: &OperationName) -> bool {
    match operation.as_str() {
        // 标量
        "Get" | "GetBatch" | "Set" | "SetBatch" | "Delete" | "KeysExist" | "ItemGetTtl"
        | "ItemGetType" => true,
        "SetIf" | "SetIfNotExists" | "Increment" | "UpdateTtl" | "IncreaseTtl"
        | "DecreaseTtl" => false,

        // 字典
        "DictionaryGet" | "DictionaryFetch" | "DictionarySet" | "DictionaryDelete"
        | "DictionaryLength" => true,
        "DictionaryIncrement" => false,

        // 集合
        "SetFetch" | "SetSample" | "SetUnion" | "SetDifference" | "SetContains"
        | "SetLength" => true,
        "SetPop" => false,

        // 列表
        "ListRemove" | "ListFetch" | "ListLength" => true,
        "ListPushFront" | "ListPushBack" | "ListPopFront" | "ListPopBack"
        | "ListConcatenateFront" | "ListConcatenateBack" | "ListRetain" => false,

        // 有序集合
        "SortedSetPut" | "SortedSetFetch" | "SortedSetGetScore" | "SortedSetRemove"
        | "SortedSetGetRank" | "SortedSetLength" | "SortedSetLengthByScore" => true,
        "SortedSetIncrement" => false,

        // 主题
        "TopicSubscribe" => true,

        _ => false,
    }
}
