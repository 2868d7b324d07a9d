//! 入れ子JSONに対するキー検索
//!
//! 明示的なスタック（LIFO）による深さ優先探索。配列要素は元の順序でpushされ
//! 逆順でpopされるため、結果の順序は元データの並びを反映しない。
//! 「このキーの値をすべて見つける」用途専用で、表示順や時系列が必要な処理
//! （動画一覧・continuationItems）には絶対に使わないこと。

use std::collections::VecDeque;

use serde_json::Value;

/// `key` に一致するキーの値を木全体から列挙するイテレータ
pub struct KeySearch<'a, 'k> {
    key: &'k str,
    stack: Vec<&'a Value>,
    found: VecDeque<&'a Value>,
}

impl<'a> Iterator for KeySearch<'a, '_> {
    type Item = &'a Value;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(value) = self.found.pop_front() {
                return Some(value);
            }

            match self.stack.pop()? {
                Value::Object(map) => {
                    for (k, v) in map {
                        if k == self.key {
                            self.found.push_back(v);
                        } else {
                            self.stack.push(v);
                        }
                    }
                }
                Value::Array(items) => self.stack.extend(items.iter()),
                _ => {}
            }
        }
    }
}

/// 木全体から `key` の値を順不同で列挙
pub fn search<'a, 'k>(tree: &'a Value, key: &'k str) -> KeySearch<'a, 'k> {
    KeySearch {
        key,
        stack: vec![tree],
        found: VecDeque::new(),
    }
}

/// 最初に見つかった `key` の値（どれが「最初」かは保証しない）
pub fn search_first<'a>(tree: &'a Value, key: &str) -> Option<&'a Value> {
    search(tree, key).next()
}
