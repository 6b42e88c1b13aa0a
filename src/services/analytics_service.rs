// src/services/analytics_service.rs

use crate::{
    common::{error::AppError, scope::Scope},
    db::AnalyticsRepository,
    models::{
        analytics::{conversion_rate, fill_pipeline, AnalyticsSummary, PeriodQuery, StageSummary, UserRevenue},
        auth::User,
    },
};

#[derive(Clone)]
pub struct AnalyticsService {
    repo: AnalyticsRepository,
}

impl AnalyticsService {
    pub fn new(repo: AnalyticsRepository) -> Self {
        Self { repo }
    }

    pub async fn pipeline(&self, user: &User) -> Result<Vec<StageSummary>, AppError> {
        let rows = self.repo.pipeline(&Scope::of(user)).await?;
        Ok(fill_pipeline(rows))
    }

    pub async fn summary(&self, user: &User, period: &PeriodQuery) -> Result<AnalyticsSummary, AppError> {
        check_period(period)?;
        let scope = Scope::of(user);

        let counts = self.repo.lead_counts(&scope, period).await?;
        let totals = self.repo.revenue_totals(&scope, period).await?;

        Ok(AnalyticsSummary {
            total_leads: counts.total_leads,
            won: counts.won,
            lost: counts.lost,
            conversion_rate: conversion_rate(counts.won, counts.lost),
            revenue_total: totals.revenue_total,
            orders_total: totals.orders_total,
        })
    }

    pub async fn revenue_by_user(&self, user: &User, period: &PeriodQuery) -> Result<Vec<UserRevenue>, AppError> {
        check_period(period)?;
        self.repo.revenue_by_user(&Scope::of(user), period).await
    }
}

fn check_period(period: &PeriodQuery) -> Result<(), AppError> {
    match (period.from, period.to) {
        (Some(from), Some(to)) if to < from => Err(AppError::InvalidDateRange),
        _ => Ok(()),
    }
}
