/// 推文分类枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// 与电动车无关
    Irrelevant = 0,
    /// 充电设施
    ChargingInfrastructure = 1,
    /// 车辆功能与性能
    VehicleFeatures = 2,
    /// 品牌与车型
    BrandsAndModels = 3,
    /// 环境影响
    EnvironmentalImpact = 4,
    /// 政策与补贴
    PoliciesAndIncentives = 5,
    /// 成本与用户体验
    CostAndExperience = 6,
    /// 行业动态
    IndustryTrends = 7,
    /// 挑战与批评
    ChallengesAndCriticism = 8,
}

impl Category {
    /// 提示词中的列出顺序：1-8，最后是 0
    pub const PROMPT_ORDER: [Category; 9] = [
        Category::ChargingInfrastructure,
        Category::VehicleFeatures,
        Category::BrandsAndModels,
        Category::EnvironmentalImpact,
        Category::PoliciesAndIncentives,
        Category::CostAndExperience,
        Category::IndustryTrends,
        Category::ChallengesAndCriticism,
        Category::Irrelevant,
    ];

    /// 获取分类代码
    pub fn code(self) -> u8 {
        self as u8
    }

    /// 获取标准名称
    pub fn name(self) -> &'static str {
        match self {
            Category::Irrelevant => "Irrelevant",
            Category::ChargingInfrastructure => "Charging Infrastructure",
            Category::VehicleFeatures => "Vehicle Features and Performance",
            Category::BrandsAndModels => "Brands and Models",
            Category::EnvironmentalImpact => "Environmental Impact",
            Category::PoliciesAndIncentives => "Policies and Incentives",
            Category::CostAndExperience => "Cost and Consumer Experience",
            Category::IndustryTrends => "Industry Trends and News",
            Category::ChallengesAndCriticism => "Challenges and Criticism",
        }
    }

    /// 提示词中使用的分类说明
    pub fn description(self) -> &'static str {
        match self {
            Category::Irrelevant => "Tweets that do not fit any category.",
            Category::ChargingInfrastructure => {
                "EV charging stations, fast vs. home chargers, charging times, costs, and new technologies."
            }
            Category::VehicleFeatures => {
                "Battery range, speed, safety, self-driving capabilities, and advanced technologies."
            }
            Category::BrandsAndModels => "Tesla, Rivian, Ford, or other EV brands and models.",
            Category::EnvironmentalImpact => {
                "Reducing carbon emissions, renewable energy integration, and mining concerns."
            }
            Category::PoliciesAndIncentives => {
                "EV subsidies, tax credits, mandates, and regulations."
            }
            Category::CostAndExperience => {
                "EV pricing, maintenance savings, insurance rates, and user reviews."
            }
            Category::IndustryTrends => {
                "EV market growth, announcements, investments, and partnerships."
            }
            Category::ChallengesAndCriticism => {
                "Infrastructure gaps, high costs, battery concerns, and EV adoption challenges."
            }
        }
    }

    /// 从代码解析分类
    pub fn from_code(code: u8) -> Option<Self> {
        Self::PROMPT_ORDER.into_iter().find(|c| c.code() == code)
    }

    /// 从模型返回的标签解析分类
    ///
    /// 只接受纯数字标签（允许首尾空白），不做任何模糊提取。
    pub fn from_label(label: &str) -> Option<Self> {
        label.trim().parse::<u8>().ok().and_then(Self::from_code)
    }
}
