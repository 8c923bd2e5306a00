//! 单键远程调用的响应类型

use crate::types::CacheValue;

/// 读取响应
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GetResponse {
    /// 命中
    Hit(CacheValue),
    /// 未找到
    Miss,
}

impl GetResponse {
    pub fn is_hit(&self) -> bool {
        matches!(self, GetResponse::Hit(_))
    }

    pub fn value(&self) -> Option<&CacheValue> {
        match self {
            GetResponse::Hit(value) => Some(value),
            GetResponse::Miss => None,
        }
    }

    pub fn into_value(self) -> Option<CacheValue> {
        match self {
            GetResponse::Hit(value) => Some(value),
            GetResponse::Miss => None,
        }
    }
}

/// 写入响应
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetResponse {
    Success,
}

/// 删除响应
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteResponse {
    Success,
}

/// 键存在性检查响应，顺序与请求中的键一致
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeysExistResponse(pub Vec<bool>);

impl KeysExistResponse {
    pub fn exists(&self) -> &[bool] {
        &self.0
    }

    /// 是否有任意一个键已经存在
    pub fn any_exist(&self) -> bool {
        self.0.iter().any(|exists| *exists)
    }
}
