use std::collections::HashMap;

/// Line items with a code below this threshold are monetary amounts, published by Naver in
/// hundreds of millions of won; ratios and per-share figures sit at or above it.
pub const LINE_ITEM_THRESHOLD: i32 = 4000;

/// Monetary amounts are published in units of 10^8 won.
pub const SOURCE_UNIT: i64 = 100_000_000;

lazy_static::lazy_static! {
    /// Static Primary Key table for the consensus line items (`naver.financial_items`).
    ///
    /// K-GAAP pages use 유보율 and 현금배당성향 for the items K-IFRS pages call 자본유보율 and
    /// 현금배당성향(%), so both labels share a code.
    pub static ref FINANCIAL_ITEMS: HashMap<&'static str, i32> = {
        let mut map = HashMap::new();
        map.insert("매출액", 1100);
        map.insert("영업이익", 1300);
        map.insert("영업이익(발표기준)", 1301);
        map.insert("세전계속사업이익", 1500);
        map.insert("당기순이익", 1600);
        map.insert("당기순이익(지배)", 1601);
        map.insert("당기순이익(비지배)", 1602);
        map.insert("자산총계", 2100);
        map.insert("부채총계", 2200);
        map.insert("이자발생부채", 2201);
        map.insert("자본총계", 2300);
        map.insert("자본총계(지배)", 2301);
        map.insert("자본총계(비지배)", 2302);
        map.insert("자본금", 2303);
        map.insert("영업활동현금흐름", 3100);
        map.insert("투자활동현금흐름", 3200);
        map.insert("CAPEX", 3201);
        map.insert("재무활동현금흐름", 3300);
        map.insert("FCF", 3401);
        map.insert("영업이익률", 4130);
        map.insert("순이익률", 4160);
        map.insert("ROE(%)", 4163);
        map.insert("ROA(%)", 4164);
        map.insert("EPS(원)", 4165);
        map.insert("부채비율", 4220);
        map.insert("자본유보율", 4230);
        map.insert("유보율", 4230);
        map.insert("BPS(원)", 4301);
        map.insert("현금DPS(원)", 4331);
        map.insert("현금배당수익률", 4332);
        map.insert("현금배당성향(%)", 4333);
        map.insert("현금배당성향", 4333);
        map.insert("PER(배)", 4501);
        map.insert("PBR(배)", 4502);
        map.insert("발행주식수(보통주)", 5000);
        map
    };
}

/// Look up the stable code of a line-item label.
pub fn financial_item_code(label: &str) -> Option<i32> {
    FINANCIAL_ITEMS.get(label.trim()).copied()
}

/// Whether values of the line item are published in [`SOURCE_UNIT`]s.
pub fn is_monetary(code: i32) -> bool {
    code < LINE_ITEM_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kgaap_synonyms_share_codes() {
        assert_eq!(financial_item_code("유보율"), financial_item_code("자본유보율"));
        assert_eq!(financial_item_code("현금배당성향"), Some(4333));
        assert_eq!(FINANCIAL_ITEMS.len(), 35);
    }

    #[test]
    fn threshold_splits_amounts_from_ratios() {
        assert!(is_monetary(1100));
        assert!(is_monetary(3401));
        assert!(!is_monetary(4000));
        assert!(!is_monetary(5000));
    }
}
