use super::types::{AmortizationRow, LoanTerms};

fn monthly_rate(annual_rate_percent: f64) -> f64 {
    annual_rate_percent / 12.0 / 100.0
}

fn term_months(term_years: i32) -> i64 {
    i64::from(term_years) * 12
}

/// Fixed monthly annuity payment for the loan. Degenerate terms pay nothing.
pub fn monthly_payment(terms: &LoanTerms) -> f64 {
    let principal = terms.effective_principal();
    if principal <= 0.0 || terms.term_years <= 0 {
        return 0.0;
    }

    let n = term_months(terms.term_years) as f64;
    if terms.annual_rate_percent == 0.0 {
        return principal / n;
    }

    // An overflowing growth factor tends to the interest-only payment.
    let r = monthly_rate(terms.annual_rate_percent);
    let growth = (1.0 + r).powf(n);
    principal * r / (1.0 - growth.recip())
}

/// Month-by-month split of each payment into principal and interest.
///
/// `extra_payment` goes straight to principal, so a positive value ends the
/// schedule before `term_years * 12` months.
pub fn amortization_schedule(terms: &LoanTerms, extra_payment: f64) -> Vec<AmortizationRow> {
    let mut balance = terms.effective_principal();
    if balance <= 0.0 || terms.term_years <= 0 {
        return Vec::new();
    }

    let r = monthly_rate(terms.annual_rate_percent);
    let payment = monthly_payment(terms);
    let months = u32::try_from(term_months(terms.term_years)).unwrap_or(u32::MAX);
    let mut schedule = Vec::new();

    for month in 1..=months {
        let interest = balance * r;
        let mut principal_portion = payment - interest + extra_payment;
        if balance < principal_portion {
            principal_portion = balance;
        }
        balance -= principal_portion;

        schedule.push(AmortizationRow {
            month,
            principal_payment: principal_portion,
            interest_payment: interest,
            total_payment: principal_portion + interest,
            remaining_balance: balance.max(0.0),
        });

        if balance <= 0.0 {
            break;
        }
    }

    schedule
}

/// Property price whose mortgage would cost `target_payment` per month.
pub fn property_from_payment(
    target_payment: f64,
    annual_rate_percent: f64,
    term_years: i32,
    down_payment: f64,
) -> f64 {
    if target_payment <= 0.0 || term_years <= 0 {
        return down_payment;
    }

    let n = term_months(term_years) as f64;
    let principal = if annual_rate_percent == 0.0 {
        target_payment * n
    } else {
        let r = monthly_rate(annual_rate_percent);
        let growth = (1.0 + r).powf(n);
        target_payment * (1.0 - growth.recip()) / r
    };

    principal + down_payment
}
