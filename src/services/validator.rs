//! 校验服务 - 业务能力层
//!
//! 保存前的本地校验，失败时不访问网关

use crate::error::ValidationError;
use crate::models::question_group::QuestionGroup;
use crate::models::question_type::QuestionType;

/// 校验题组基本信息（标题、题型、载荷匹配）
pub fn validate_group_fields(group: &QuestionGroup) -> Result<QuestionType, ValidationError> {
    if group.title.trim().is_empty() {
        return Err(ValidationError::MissingTitle);
    }
    let question_type = group.question_type.ok_or(ValidationError::MissingType)?;

    if let Some(payload) = group.structured_payload() {
        if !payload.fits(question_type) {
            return Err(ValidationError::PayloadMismatch { question_type });
        }
    }
    Ok(question_type)
}

/// 定稿校验：基本信息 + 至少一个小题 + 所有小题都有答案
pub fn validate_for_finalize(group: &QuestionGroup) -> Result<QuestionType, ValidationError> {
    let question_type = validate_group_fields(group)?;

    if group.is_empty() {
        return Err(ValidationError::NoSubQuestions);
    }

    let orders: Vec<u32> = group
        .sub_questions()
        .iter()
        .filter(|q| !q.has_answer())
        .map(|q| q.order)
        .collect();
    if !orders.is_empty() {
        return Err(ValidationError::EmptyAnswers { orders });
    }

    Ok(question_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::payload::{StructuredPayload, SummaryData};
    use crate::models::sub_question::{Choice, SubQuestion};

    fn answered(answer: &str) -> SubQuestion {
        SubQuestion {
            correct_answer: answer.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_title_and_type() {
        let group = QuestionGroup::new();
        assert_eq!(
            validate_group_fields(&group),
            Err(ValidationError::MissingTitle)
        );

        let group = QuestionGroup {
            title: "Questions 1-5".into(),
            ..Default::default()
        };
        assert_eq!(
            validate_group_fields(&group),
            Err(ValidationError::MissingType)
        );
    }

    #[test]
    fn test_payload_mismatch() {
        let group = QuestionGroup::with_type("T", QuestionType::TableCompletion)
            .with_payload(StructuredPayload::Summary(SummaryData::default()));
        assert_eq!(
            validate_group_fields(&group),
            Err(ValidationError::PayloadMismatch {
                question_type: QuestionType::TableCompletion
            })
        );
    }

    #[test]
    fn test_finalize_reports_empty_answers_by_order() {
        let mut group = QuestionGroup::with_type("T", QuestionType::ShortAnswer);
        assert_eq!(
            validate_for_finalize(&group),
            Err(ValidationError::NoSubQuestions)
        );

        group.push_sub_question(answered("cat"));
        group.push_sub_question(answered("  "));
        group.push_sub_question(answered(""));
        assert_eq!(
            validate_for_finalize(&group),
            Err(ValidationError::EmptyAnswers { orders: vec![2, 3] })
        );
    }

    #[test]
    fn test_finalize_accepts_correct_choice() {
        let mut group = QuestionGroup::with_type("T", QuestionType::Mcq);
        group.push_sub_question(SubQuestion {
            choices: vec![Choice {
                text: "Paris".into(),
                is_correct: true,
            }],
            ..Default::default()
        });
        assert_eq!(validate_for_finalize(&group), Ok(QuestionType::Mcq));
    }
}
