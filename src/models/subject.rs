/// 科目枚举
///
/// 仅用于选科界面；出题与计分都按科目名称字符串精确匹配
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subject {
    /// 物理
    Physics,
    /// 化学
    Chemistry,
    /// 生物
    Biology,
    /// 阿拉伯语
    Arabic,
    /// 数学
    Math,
    /// 历史
    History,
    /// 地理
    Geography,
    /// 法语
    French,
    /// 意大利语
    Italian,
    /// 宗教
    Religion,
    /// 哲学与心理学
    PhilosophyPsychology,
}

impl Subject {
    /// 选科界面上的全部科目（按展示顺序）
    pub const ALL: [Subject; 11] = [
        Subject::Physics,
        Subject::Chemistry,
        Subject::Biology,
        Subject::Arabic,
        Subject::Math,
        Subject::History,
        Subject::Geography,
        Subject::French,
        Subject::Italian,
        Subject::Religion,
        Subject::PhilosophyPsychology,
    ];

    /// 获取标准名称
    pub fn name(self) -> &'static str {
        match self {
            Subject::Physics => "الفيزياء",
            Subject::Chemistry => "الكيمياء",
            Subject::Biology => "الأحياء",
            Subject::Arabic => "لغة عربية",
            Subject::Math => "رياضيات",
            Subject::History => "تاريخ",
            Subject::Geography => "جغرافيا",
            Subject::French => "لغة فرنسية",
            Subject::Italian => "لغة إيطالية",
            Subject::Religion => "دين",
            Subject::PhilosophyPsychology => "فلسفة وعلم نفس",
        }
    }

    /// 从名称解析科目（精确匹配）
    pub fn from_name(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL.into_iter().find(|subject| subject.name() == s)
    }

    /// 全部科目名称（"综合测试"）
    pub fn all_names() -> Vec<String> {
        Self::ALL.iter().map(|s| s.name().to_string()).collect()
    }
}

impl std::fmt::Display for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name_exact() {
        assert_eq!(Subject::from_name("رياضيات"), Some(Subject::Math));
        assert_eq!(Subject::from_name(" دين "), Some(Subject::Religion));
        assert_eq!(Subject::from_name("رياضة"), None);
    }

    #[test]
    fn test_all_names_round_trip() {
        let names = Subject::all_names();
        assert_eq!(names.len(), 11);
        for name in &names {
            assert!(Subject::from_name(name).is_some());
        }
    }
}
